// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request builders shared by all the bucket sub-resources.
//!
//! Access control entries, default object access control entries, and
//! notification configurations are collections nested under a bucket. Each
//! entry is addressed by a key: the entity for access controls, the id for
//! notifications. The builders in this module implement create, get, list,
//! update, patch, and delete for any such collection.

use super::client::Storage;
use super::perform_request::RequestCommon;
use super::{bucket_path, enc, request_builder};
use crate::error::RequestError;
use crate::model::ListItems;
use crate::patch::{PatchDocument, Patchable};
use crate::transport::HttpRequest;
use crate::{Error, Result};
use http::Method;

/// A collection of entries nested under a bucket.
///
/// This trait is implemented by [BucketAccessControl][crate::model::BucketAccessControl],
/// [ObjectAccessControl][crate::model::ObjectAccessControl], and
/// [NotificationConfig][crate::model::NotificationConfig]. Applications do
/// not need to implement it.
pub trait SubResource: Patchable + Clone + std::fmt::Debug + Send + Sync + 'static {
    /// The path segment for the collection, e.g. `acl`.
    const COLLECTION: &'static str;

    /// A human readable name for the entries, used in errors.
    const NAME: &'static str;

    /// The name of the field used to address entries.
    const KEY_FIELD: &'static str;

    /// If false, entries cannot be updated or patched once created.
    const MUTABLE: bool;

    /// The value used to address this entry, if known.
    fn key(&self) -> Option<&str>;

    /// The payload sent to create the entry.
    fn create_payload(&self) -> Self {
        self.clone()
    }
}

fn collection_path<T: SubResource>(bucket: &str) -> Result<String> {
    Ok(format!("{}/{}", bucket_path(bucket)?, T::COLLECTION))
}

fn entry_path<T: SubResource>(bucket: &str, key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::binding(RequestError::MissingKey {
            resource: T::NAME,
            field: T::KEY_FIELD,
        }));
    }
    Ok(format!("{}/{}", collection_path::<T>(bucket)?, enc(key)))
}

fn check_mutable<T: SubResource>() -> Result<()> {
    if T::MUTABLE {
        return Ok(());
    }
    Err(Error::binding(RequestError::ImmutableResource(T::NAME)))
}

impl Storage {
    /// Creates an entry in a bucket sub-resource collection.
    ///
    /// Prefer the typed functions, such as
    /// [create_bucket_acl()][Storage::create_bucket_acl].
    pub fn create_sub_resource<T, B>(&self, bucket: B, entry: T) -> CreateSubResource<T>
    where
        T: SubResource,
        B: Into<String>,
    {
        CreateSubResource {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            entry,
        }
    }

    /// Fetches an entry from a bucket sub-resource collection.
    pub fn get_sub_resource<T, B, K>(&self, bucket: B, key: K) -> GetSubResource<T>
    where
        T: SubResource,
        B: Into<String>,
        K: Into<String>,
    {
        GetSubResource {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            key: key.into(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Lists all the entries in a bucket sub-resource collection.
    pub fn list_sub_resources<T, B>(&self, bucket: B) -> ListSubResources<T>
    where
        T: SubResource,
        B: Into<String>,
    {
        ListSubResources {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Replaces an entry in a bucket sub-resource collection.
    ///
    /// The entry is addressed by its key, e.g. the `entity` of an access
    /// control entry. Fails before sending the request if the entries are
    /// immutable.
    pub fn update_sub_resource<T, B>(&self, bucket: B, entry: T) -> UpdateSubResource<T>
    where
        T: SubResource,
        B: Into<String>,
    {
        UpdateSubResource {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            entry,
        }
    }

    /// Changes the fields of an entry that differ between two snapshots.
    ///
    /// Fails before sending the request if the entries are immutable.
    pub fn patch_sub_resource<T, B, K>(
        &self,
        bucket: B,
        key: K,
        original: T,
        desired: T,
    ) -> PatchSubResource<T>
    where
        T: SubResource,
        B: Into<String>,
        K: Into<String>,
    {
        PatchSubResource {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            key: key.into(),
            original,
            desired,
        }
    }

    /// Removes an entry from a bucket sub-resource collection.
    pub fn delete_sub_resource<T, B, K>(&self, bucket: B, key: K) -> DeleteSubResource<T>
    where
        T: SubResource,
        B: Into<String>,
        K: Into<String>,
    {
        DeleteSubResource {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            key: key.into(),
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The request builder to create sub-resource entries.
///
/// Creating entries is not idempotent.
#[derive(Clone, Debug)]
pub struct CreateSubResource<T> {
    common: RequestCommon,
    bucket: String,
    entry: T,
}

request_builder!(CreateSubResource<T>);

impl<T: SubResource> CreateSubResource<T> {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::POST, collection_path::<T>(&self.bucket)?)
            .with_json_body(&self.entry.create_payload())?;
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<T> {
        let request = self.http_request()?;
        self.common.execute(request, false).await
    }
}

/// The request builder to fetch sub-resource entries.
#[derive(Clone, Debug)]
pub struct GetSubResource<T> {
    common: RequestCommon,
    bucket: String,
    key: String,
    _phantom: std::marker::PhantomData<T>,
}

request_builder!(GetSubResource<T>);

impl<T: SubResource> GetSubResource<T> {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::GET, entry_path::<T>(&self.bucket, &self.key)?);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<T> {
        let request = self.http_request()?;
        self.common.execute(request, true).await
    }
}

/// The request builder to list sub-resource entries.
///
/// These collections are small, the service returns all the entries in a
/// single response.
#[derive(Clone, Debug)]
pub struct ListSubResources<T> {
    common: RequestCommon,
    bucket: String,
    _phantom: std::marker::PhantomData<T>,
}

request_builder!(ListSubResources<T>);

impl<T: SubResource> ListSubResources<T> {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::GET, collection_path::<T>(&self.bucket)?);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Vec<T>> {
        let request = self.http_request()?;
        let response: ListItems<T> = self.common.execute(request, true).await?;
        Ok(response.items)
    }
}

/// The request builder to replace sub-resource entries.
///
/// The request is idempotent only if it has a match precondition.
#[derive(Clone, Debug)]
pub struct UpdateSubResource<T> {
    common: RequestCommon,
    bucket: String,
    entry: T,
}

request_builder!(UpdateSubResource<T>);

impl<T: SubResource> UpdateSubResource<T> {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        check_mutable::<T>()?;
        self.common.check_update_policy()?;
        let key = self.entry.key().unwrap_or_default();
        let request = HttpRequest::new(Method::PUT, entry_path::<T>(&self.bucket, key)?)
            .with_json_body(&self.entry)?;
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<T> {
        let request = self.http_request()?;
        let idempotent = self.common.update_is_idempotent();
        self.common.execute(request, idempotent).await
    }
}

/// The request builder to patch sub-resource entries.
///
/// The request is idempotent only if it has a match precondition.
#[derive(Clone, Debug)]
pub struct PatchSubResource<T> {
    common: RequestCommon,
    bucket: String,
    key: String,
    original: T,
    desired: T,
}

request_builder!(PatchSubResource<T>);

impl<T: SubResource> PatchSubResource<T> {
    /// The patch document sent to the service.
    pub fn patch_document(&self) -> Result<PatchDocument> {
        PatchDocument::diff(&self.original, &self.desired)
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        check_mutable::<T>()?;
        self.common.check_update_policy()?;
        let request = HttpRequest::new(Method::PATCH, entry_path::<T>(&self.bucket, &self.key)?)
            .with_json_body(&self.patch_document()?)?;
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<T> {
        let request = self.http_request()?;
        let idempotent = self.common.update_is_idempotent();
        self.common.execute(request, idempotent).await
    }
}

/// The request builder to delete sub-resource entries.
#[derive(Clone, Debug)]
pub struct DeleteSubResource<T> {
    common: RequestCommon,
    bucket: String,
    key: String,
    _phantom: std::marker::PhantomData<T>,
}

request_builder!(DeleteSubResource<T>);

impl<T: SubResource> DeleteSubResource<T> {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::DELETE, entry_path::<T>(&self.bucket, &self.key)?);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<()> {
        let request = self.http_request()?;
        self.common.execute_empty(request, true).await
    }
}

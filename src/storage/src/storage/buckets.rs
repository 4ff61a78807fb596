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

use super::client::Storage;
use super::perform_request::RequestCommon;
use super::{bucket_id, bucket_path, request_builder};
use crate::error::RequestError;
use crate::model::{Bucket, ListBucketsResponse, PredefinedAcl, PredefinedObjectAcl, Projection};
use crate::patch::{PatchDocument, validate_bucket_patch};
use crate::transport::HttpRequest;
use crate::{Error, Result};
use gax::paginator::{ItemPaginator, Paginator};
use http::Method;

impl Storage {
    /// Creates a new bucket in `project`.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// use bucket_admin::model::{Bucket, Versioning};
    /// let bucket = client
    ///     .create_bucket("my-project", "my-bucket")
    ///     .with_metadata(Bucket::new().set_location("US").set_versioning(Versioning::new(true)))
    ///     .send()
    ///     .await?;
    /// println!("created {bucket:?}");
    /// # Ok(()) }
    /// ```
    pub fn create_bucket<P, B>(&self, project: P, bucket: B) -> CreateBucket
    where
        P: Into<String>,
        B: Into<String>,
    {
        CreateBucket::new(self, project.into(), bucket.into())
    }

    /// Fetches the metadata for a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let bucket = client.get_bucket("my-bucket").send().await?;
    /// println!("metageneration={:?}", bucket.metageneration);
    /// # Ok(()) }
    /// ```
    pub fn get_bucket<B: Into<String>>(&self, bucket: B) -> GetBucket {
        GetBucket::new(self, bucket.into())
    }

    /// Lists the buckets in a project.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let mut items = client.list_buckets("my-project").by_item();
    /// while let Some(bucket) = items.next().await.transpose()? {
    ///     println!("{:?}", bucket.name);
    /// }
    /// # Ok(()) }
    /// ```
    pub fn list_buckets<P: Into<String>>(&self, project: P) -> ListBuckets {
        ListBuckets::new(self, project.into())
    }

    /// Replaces the metadata of a bucket.
    ///
    /// The bucket is identified by `metadata.name`. All the fields of the
    /// bucket are replaced, fields not present in `metadata` are reset to
    /// their default values.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// use bucket_admin::builder::storage::PreconditionsBuilder;
    /// let current = client.get_bucket("my-bucket").send().await?;
    /// let metageneration = current.metageneration.as_option().cloned();
    /// let desired = current.set_storage_class("NEARLINE");
    /// let mut builder = client.update_bucket(desired);
    /// if let Some(m) = metageneration {
    ///     builder = builder.with_if_metageneration_match(m);
    /// }
    /// let updated = builder.send().await?;
    /// # Ok(()) }
    /// ```
    pub fn update_bucket(&self, metadata: Bucket) -> UpdateBucket {
        UpdateBucket::new(self, metadata)
    }

    /// Changes the fields of a bucket that differ between two snapshots.
    ///
    /// The request contains only the fields that change between `original`
    /// and `desired`. See [diff][crate::patch::diff] for the details.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let original = client.get_bucket("my-bucket").send().await?;
    /// let desired = original.clone().set_storage_class("COLDLINE").clear_website();
    /// let updated = client
    ///     .patch_bucket("my-bucket", original, desired)
    ///     .send()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn patch_bucket<B: Into<String>>(
        &self,
        bucket: B,
        original: Bucket,
        desired: Bucket,
    ) -> PatchBucket {
        PatchBucket::new(self, bucket.into(), PatchSource::Diff { original, desired })
    }

    /// Applies a prepared patch document to a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// use bucket_admin::patch::PatchDocument;
    /// let patch = PatchDocument::new()
    ///     .set("storageClass", "COLDLINE")?
    ///     .clear("website");
    /// let updated = client.patch_bucket_with("my-bucket", patch).send().await?;
    /// # Ok(()) }
    /// ```
    pub fn patch_bucket_with<B: Into<String>>(&self, bucket: B, patch: PatchDocument) -> PatchBucket {
        PatchBucket::new(self, bucket.into(), PatchSource::Document(patch))
    }

    /// Deletes an empty bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// client.delete_bucket("my-bucket").send().await?;
    /// # Ok(()) }
    /// ```
    pub fn delete_bucket<B: Into<String>>(&self, bucket: B) -> DeleteBucket {
        DeleteBucket::new(self, bucket.into())
    }
}

/// Optional query parameters for bucket mutations.
#[derive(Clone, Debug, Default)]
struct BucketParams {
    projection: Option<Projection>,
    predefined_acl: Option<PredefinedAcl>,
    predefined_default_object_acl: Option<PredefinedObjectAcl>,
}

impl BucketParams {
    fn apply(&self, request: HttpRequest) -> HttpRequest {
        let request = self
            .projection
            .iter()
            .fold(request, |r, v| r.with_query("projection", v.as_str()));
        let request = self
            .predefined_acl
            .iter()
            .fold(request, |r, v| r.with_query("predefinedAcl", v.as_str()));
        self.predefined_default_object_acl
            .iter()
            .fold(request, |r, v| {
                r.with_query("predefinedDefaultObjectAcl", v.as_str())
            })
    }
}

macro_rules! bucket_params {
    ($type:ty) => {
        impl $type {
            /// Selects which fields are included in the response.
            pub fn with_projection(mut self, v: Projection) -> Self {
                self.params.projection = Some(v);
                self
            }

            /// Applies a predefined set of access controls to the bucket.
            pub fn with_predefined_acl(mut self, v: PredefinedAcl) -> Self {
                self.params.predefined_acl = Some(v);
                self
            }

            /// Applies a predefined set of default object access controls to
            /// the bucket.
            pub fn with_predefined_default_object_acl(mut self, v: PredefinedObjectAcl) -> Self {
                self.params.predefined_default_object_acl = Some(v);
                self
            }
        }
    };
}

/// The request builder for [Storage::create_bucket] calls.
///
/// Creating a bucket is not idempotent, the client only retries the request
/// if it fails before it is sent.
#[derive(Clone, Debug)]
pub struct CreateBucket {
    common: RequestCommon,
    project: String,
    bucket: String,
    metadata: Bucket,
    params: BucketParams,
}

request_builder!(CreateBucket);
bucket_params!(CreateBucket);

impl CreateBucket {
    fn new(client: &Storage, project: String, bucket: String) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            project,
            bucket,
            metadata: Bucket::new(),
            params: BucketParams::default(),
        }
    }

    /// The initial metadata for the bucket.
    ///
    /// The bucket name is always the name used in
    /// [create_bucket()][Storage::create_bucket].
    pub fn with_metadata(mut self, v: Bucket) -> Self {
        self.metadata = v;
        self
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        if self.project.is_empty() {
            return Err(Error::binding(RequestError::EmptyProject));
        }
        let id = bucket_id(&self.bucket)?;
        let body = self.metadata.clone().set_name(id);
        let request = HttpRequest::new(Method::POST, "/b")
            .with_query("project", self.project.as_str())
            .with_json_body(&body)?;
        let request = self.params.apply(request);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Bucket> {
        let request = self.http_request()?;
        self.common.execute(request, false).await
    }
}

/// The request builder for [Storage::get_bucket] calls.
#[derive(Clone, Debug)]
pub struct GetBucket {
    common: RequestCommon,
    bucket: String,
    projection: Option<Projection>,
}

request_builder!(GetBucket);

impl GetBucket {
    fn new(client: &Storage, bucket: String) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            bucket,
            projection: None,
        }
    }

    /// Selects which fields are included in the response.
    pub fn with_projection(mut self, v: Projection) -> Self {
        self.projection = Some(v);
        self
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::GET, bucket_path(&self.bucket)?);
        let request = self
            .projection
            .iter()
            .fold(request, |r, v| r.with_query("projection", v.as_str()));
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Bucket> {
        let request = self.http_request()?;
        self.common.execute(request, true).await
    }
}

/// The request builder for [Storage::list_buckets] calls.
///
/// # Example
/// ```
/// # use bucket_admin::client::Storage;
/// # async fn sample(client: &Storage) -> anyhow::Result<()> {
/// let mut pages = client
///     .list_buckets("my-project")
///     .set_prefix("logs-")
///     .set_max_results(100)
///     .by_page();
/// while let Some(page) = pages.next().await.transpose()? {
///     println!("{} buckets in page", page.items.len());
/// }
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct ListBuckets {
    common: RequestCommon,
    project: String,
    max_results: Option<u32>,
    prefix: Option<String>,
    page_token: Option<String>,
    projection: Option<Projection>,
}

request_builder!(ListBuckets);

impl ListBuckets {
    fn new(client: &Storage, project: String) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            project,
            max_results: None,
            prefix: None,
            page_token: None,
            projection: None,
        }
    }

    /// The maximum number of buckets in each page.
    pub fn set_max_results(mut self, v: u32) -> Self {
        self.max_results = Some(v);
        self
    }

    /// Only list buckets whose names start with this prefix.
    pub fn set_prefix<T: Into<String>>(mut self, v: T) -> Self {
        self.prefix = Some(v.into());
        self
    }

    /// Start the listing at this page.
    pub fn set_page_token<T: Into<String>>(mut self, v: T) -> Self {
        self.page_token = Some(v.into());
        self
    }

    /// Selects which fields are included in the response.
    pub fn with_projection(mut self, v: Projection) -> Self {
        self.projection = Some(v);
        self
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        if self.project.is_empty() {
            return Err(Error::binding(RequestError::EmptyProject));
        }
        let request = HttpRequest::new(Method::GET, "/b").with_query("project", self.project.as_str());
        let request = self
            .max_results
            .iter()
            .fold(request, |r, v| r.with_query("maxResults", v.to_string()));
        let request = self
            .prefix
            .iter()
            .fold(request, |r, v| r.with_query("prefix", v));
        let request = self
            .page_token
            .iter()
            .filter(|t| !t.is_empty())
            .fold(request, |r, v| r.with_query("pageToken", v));
        let request = self
            .projection
            .iter()
            .fold(request, |r, v| r.with_query("projection", v.as_str()));
        self.common.decorate(request)
    }

    /// Fetches a single page.
    pub async fn send(self) -> Result<ListBucketsResponse> {
        let request = self.http_request()?;
        self.common.execute(request, true).await
    }

    /// Streams the pages of the listing.
    pub fn by_page(self) -> Paginator<ListBucketsResponse, Error> {
        let token = self.page_token.clone().unwrap_or_default();
        let execute = move |token: String| {
            let builder = self.clone().set_page_token(token);
            builder.send()
        };
        Paginator::new(token, execute)
    }

    /// Streams the buckets in the listing, fetching pages as needed.
    pub fn by_item(self) -> ItemPaginator<ListBucketsResponse, Error> {
        self.by_page().items()
    }
}

/// The request builder for [Storage::update_bucket] calls.
///
/// The request is idempotent only if it has a match precondition.
#[derive(Clone, Debug)]
pub struct UpdateBucket {
    common: RequestCommon,
    metadata: Bucket,
    params: BucketParams,
}

request_builder!(UpdateBucket);
bucket_params!(UpdateBucket);

impl UpdateBucket {
    fn new(client: &Storage, metadata: Bucket) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            metadata,
            params: BucketParams::default(),
        }
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        self.common.check_update_policy()?;
        let name = self.metadata.name.as_option().ok_or_else(|| {
            Error::binding(RequestError::MissingKey {
                resource: "bucket",
                field: "name",
            })
        })?;
        let request =
            HttpRequest::new(Method::PUT, bucket_path(name)?).with_json_body(&self.metadata)?;
        let request = self.params.apply(request);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Bucket> {
        let request = self.http_request()?;
        let idempotent = self.common.update_is_idempotent();
        self.common.execute(request, idempotent).await
    }
}

#[derive(Clone, Debug)]
enum PatchSource {
    Diff { original: Bucket, desired: Bucket },
    Document(PatchDocument),
}

/// The request builder for [Storage::patch_bucket] and
/// [Storage::patch_bucket_with] calls.
///
/// The request is idempotent only if it has a match precondition. An empty
/// patch is still sent, the service returns the current metadata.
#[derive(Clone, Debug)]
pub struct PatchBucket {
    common: RequestCommon,
    bucket: String,
    patch: PatchSource,
    params: BucketParams,
}

request_builder!(PatchBucket);
bucket_params!(PatchBucket);

impl PatchBucket {
    fn new(client: &Storage, bucket: String, patch: PatchSource) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            bucket,
            patch,
            params: BucketParams::default(),
        }
    }

    /// The patch document sent to the service.
    pub fn patch_document(&self) -> Result<PatchDocument> {
        match &self.patch {
            PatchSource::Document(d) => Ok(d.clone()),
            PatchSource::Diff { original, desired } => {
                validate_bucket_patch(original, desired).map_err(Error::binding)?;
                PatchDocument::diff(original, desired)
            }
        }
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        self.common.check_update_policy()?;
        let patch = self.patch_document()?;
        let request =
            HttpRequest::new(Method::PATCH, bucket_path(&self.bucket)?).with_json_body(&patch)?;
        let request = self.params.apply(request);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Bucket> {
        let request = self.http_request()?;
        let idempotent = self.common.update_is_idempotent();
        self.common.execute(request, idempotent).await
    }
}

/// The request builder for [Storage::delete_bucket] calls.
#[derive(Clone, Debug)]
pub struct DeleteBucket {
    common: RequestCommon,
    bucket: String,
}

request_builder!(DeleteBucket);

impl DeleteBucket {
    fn new(client: &Storage, bucket: String) -> Self {
        Self {
            common: RequestCommon::new(client.inner.clone()),
            bucket,
        }
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::DELETE, bucket_path(&self.bucket)?);
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<()> {
        let request = self.http_request()?;
        self.common.execute_empty(request, true).await
    }
}

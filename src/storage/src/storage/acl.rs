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
use super::sub_resource::{
    CreateSubResource, DeleteSubResource, GetSubResource, ListSubResources, PatchSubResource,
    SubResource, UpdateSubResource,
};
use crate::model::{BucketAccessControl, ObjectAccessControl};

/// The request builder for [Storage::create_bucket_acl] calls.
pub type CreateBucketAcl = CreateSubResource<BucketAccessControl>;
/// The request builder for [Storage::get_bucket_acl] calls.
pub type GetBucketAcl = GetSubResource<BucketAccessControl>;
/// The request builder for [Storage::list_bucket_acl] calls.
pub type ListBucketAcl = ListSubResources<BucketAccessControl>;
/// The request builder for [Storage::update_bucket_acl] calls.
pub type UpdateBucketAcl = UpdateSubResource<BucketAccessControl>;
/// The request builder for [Storage::patch_bucket_acl] calls.
pub type PatchBucketAcl = PatchSubResource<BucketAccessControl>;
/// The request builder for [Storage::delete_bucket_acl] calls.
pub type DeleteBucketAcl = DeleteSubResource<BucketAccessControl>;

/// The request builder for [Storage::create_default_object_acl] calls.
pub type CreateDefaultObjectAcl = CreateSubResource<ObjectAccessControl>;
/// The request builder for [Storage::get_default_object_acl] calls.
pub type GetDefaultObjectAcl = GetSubResource<ObjectAccessControl>;
/// The request builder for [Storage::list_default_object_acl] calls.
pub type ListDefaultObjectAcl = ListSubResources<ObjectAccessControl>;
/// The request builder for [Storage::update_default_object_acl] calls.
pub type UpdateDefaultObjectAcl = UpdateSubResource<ObjectAccessControl>;
/// The request builder for [Storage::patch_default_object_acl] calls.
pub type PatchDefaultObjectAcl = PatchSubResource<ObjectAccessControl>;
/// The request builder for [Storage::delete_default_object_acl] calls.
pub type DeleteDefaultObjectAcl = DeleteSubResource<ObjectAccessControl>;

impl SubResource for BucketAccessControl {
    const COLLECTION: &'static str = "acl";
    const NAME: &'static str = "bucket ACL";
    const KEY_FIELD: &'static str = "entity";
    const MUTABLE: bool = true;

    fn key(&self) -> Option<&str> {
        self.entity.as_option().map(String::as_str)
    }

    // Only the entity and role are settable, the service rejects any other
    // field in a create request.
    fn create_payload(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            role: self.role.clone(),
            ..Default::default()
        }
    }
}

impl SubResource for ObjectAccessControl {
    const COLLECTION: &'static str = "defaultObjectAcl";
    const NAME: &'static str = "default object ACL";
    const KEY_FIELD: &'static str = "entity";
    const MUTABLE: bool = true;

    fn key(&self) -> Option<&str> {
        self.entity.as_option().map(String::as_str)
    }

    fn create_payload(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            role: self.role.clone(),
            ..Default::default()
        }
    }
}

impl Storage {
    /// Grants `role` to `entity` on a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let entry = client
    ///     .create_bucket_acl("my-bucket", "user-liz@example.com", "READER")
    ///     .send()
    ///     .await?;
    /// println!("created {entry:?}");
    /// # Ok(()) }
    /// ```
    pub fn create_bucket_acl<B, E, R>(&self, bucket: B, entity: E, role: R) -> CreateBucketAcl
    where
        B: Into<String>,
        E: Into<String>,
        R: Into<String>,
    {
        self.create_sub_resource(bucket, BucketAccessControl::new(entity, role))
    }

    /// Fetches the access control entry for `entity` on a bucket.
    pub fn get_bucket_acl<B, E>(&self, bucket: B, entity: E) -> GetBucketAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.get_sub_resource(bucket, entity)
    }

    /// Lists the access control entries on a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// for entry in client.list_bucket_acl("my-bucket").send().await? {
    ///     println!("{:?} => {:?}", entry.entity, entry.role);
    /// }
    /// # Ok(()) }
    /// ```
    pub fn list_bucket_acl<B: Into<String>>(&self, bucket: B) -> ListBucketAcl {
        self.list_sub_resources(bucket)
    }

    /// Replaces an access control entry on a bucket.
    ///
    /// The entry is addressed by `entry.entity`.
    pub fn update_bucket_acl<B: Into<String>>(
        &self,
        bucket: B,
        entry: BucketAccessControl,
    ) -> UpdateBucketAcl {
        self.update_sub_resource(bucket, entry)
    }

    /// Changes the role of an access control entry on a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// use bucket_admin::builder::storage::PreconditionsBuilder;
    /// let original = client.get_bucket_acl("my-bucket", "user-liz@example.com").send().await?;
    /// let desired = original.clone().set_role("OWNER");
    /// let mut builder = client.patch_bucket_acl("my-bucket", "user-liz@example.com", original.clone(), desired);
    /// if let Some(etag) = original.etag.as_option() {
    ///     builder = builder.with_if_etag_match(etag.clone());
    /// }
    /// let updated = builder.send().await?;
    /// # Ok(()) }
    /// ```
    pub fn patch_bucket_acl<B, E>(
        &self,
        bucket: B,
        entity: E,
        original: BucketAccessControl,
        desired: BucketAccessControl,
    ) -> PatchBucketAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.patch_sub_resource(bucket, entity, original, desired)
    }

    /// Removes the access control entry for `entity` from a bucket.
    pub fn delete_bucket_acl<B, E>(&self, bucket: B, entity: E) -> DeleteBucketAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.delete_sub_resource(bucket, entity)
    }

    /// Adds an entry to the default object ACL of a bucket.
    ///
    /// New objects in the bucket receive these entries when the request
    /// creating them does not set an ACL.
    pub fn create_default_object_acl<B, E, R>(
        &self,
        bucket: B,
        entity: E,
        role: R,
    ) -> CreateDefaultObjectAcl
    where
        B: Into<String>,
        E: Into<String>,
        R: Into<String>,
    {
        self.create_sub_resource(bucket, ObjectAccessControl::new(entity, role))
    }

    /// Fetches an entry from the default object ACL of a bucket.
    pub fn get_default_object_acl<B, E>(&self, bucket: B, entity: E) -> GetDefaultObjectAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.get_sub_resource(bucket, entity)
    }

    /// Lists the default object ACL of a bucket.
    pub fn list_default_object_acl<B: Into<String>>(&self, bucket: B) -> ListDefaultObjectAcl {
        self.list_sub_resources(bucket)
    }

    /// Replaces an entry in the default object ACL of a bucket.
    pub fn update_default_object_acl<B: Into<String>>(
        &self,
        bucket: B,
        entry: ObjectAccessControl,
    ) -> UpdateDefaultObjectAcl {
        self.update_sub_resource(bucket, entry)
    }

    /// Changes the role of an entry in the default object ACL of a bucket.
    pub fn patch_default_object_acl<B, E>(
        &self,
        bucket: B,
        entity: E,
        original: ObjectAccessControl,
        desired: ObjectAccessControl,
    ) -> PatchDefaultObjectAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.patch_sub_resource(bucket, entity, original, desired)
    }

    /// Removes an entry from the default object ACL of a bucket.
    pub fn delete_default_object_acl<B, E>(&self, bucket: B, entity: E) -> DeleteDefaultObjectAcl
    where
        B: Into<String>,
        E: Into<String>,
    {
        self.delete_sub_resource(bucket, entity)
    }
}

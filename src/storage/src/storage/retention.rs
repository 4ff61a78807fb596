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
use super::{bucket_path, request_builder};
use crate::Result;
use crate::model::Metageneration;
use crate::transport::HttpRequest;
use http::Method;

impl Storage {
    /// Locks the retention policy of a bucket.
    ///
    /// Locking is permanent: a locked policy cannot be removed, and its
    /// retention period can only increase. The request is conditional on the
    /// current metageneration of the bucket, which guarantees the policy
    /// being locked is the policy the application read.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let bucket = client.get_bucket("my-bucket").send().await?;
    /// if let Some(metageneration) = bucket.metageneration.into_option() {
    ///     client
    ///         .lock_bucket_retention_policy("my-bucket", metageneration)
    ///         .send()
    ///         .await?;
    /// }
    /// # Ok(()) }
    /// ```
    pub fn lock_bucket_retention_policy<B, M>(
        &self,
        bucket: B,
        metageneration: M,
    ) -> LockBucketRetentionPolicy
    where
        B: Into<String>,
        M: Into<Metageneration>,
    {
        LockBucketRetentionPolicy {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            metageneration: metageneration.into(),
        }
    }
}

/// The request builder for [Storage::lock_bucket_retention_policy] calls.
///
/// The request always carries a metageneration precondition, so it is
/// idempotent.
#[derive(Clone, Debug)]
pub struct LockBucketRetentionPolicy {
    common: RequestCommon,
    bucket: String,
    metageneration: Metageneration,
}

request_builder!(LockBucketRetentionPolicy);

impl LockBucketRetentionPolicy {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let path = format!("{}/lockRetentionPolicy", bucket_path(&self.bucket)?);
        let mut common = self.common.clone();
        common.preconditions.if_metageneration_match = Some(self.metageneration.clone());
        common.decorate(HttpRequest::new(Method::POST, path))
    }

    /// Sends the request.
    ///
    /// The response payload is ignored.
    pub async fn send(self) -> Result<()> {
        let request = self.http_request()?;
        self.common.execute_empty(request, true).await
    }
}

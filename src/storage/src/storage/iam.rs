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
use crate::error::RequestError;
use crate::model::{IamPolicy, LEGACY_BUCKET_OWNER_ROLE, TestIamPermissionsResponse};
use crate::transport::HttpRequest;
use crate::{Error, Result};
use gax::error::rpc::{Code, Status};
use http::Method;

impl Storage {
    /// Fetches the IAM policy of a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let policy = client.get_bucket_iam_policy("my-bucket").send().await?;
    /// for (role, members) in &policy.bindings {
    ///     println!("{role} => {members:?}");
    /// }
    /// # Ok(()) }
    /// ```
    pub fn get_bucket_iam_policy<B: Into<String>>(&self, bucket: B) -> GetBucketIamPolicy {
        GetBucketIamPolicy {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            requested_policy_version: None,
        }
    }

    /// Replaces the IAM policy of a bucket.
    ///
    /// The policy must include the etag of the policy it replaces, and must
    /// keep at least one member in `roles/storage.legacyBucketOwner`. If the
    /// policy changed since it was read the request fails with a
    /// [Conflict][gax::error::FailureKind::Conflict] error. Use
    /// [update_iam_policy][crate::iam_occ::update_iam_policy] to retry these
    /// conflicts automatically.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let mut policy = client.get_bucket_iam_policy("my-bucket").send().await?;
    /// policy.add_member("roles/storage.objectViewer", "user:liz@example.com");
    /// let updated = client.set_bucket_iam_policy("my-bucket", policy).send().await?;
    /// # Ok(()) }
    /// ```
    pub fn set_bucket_iam_policy<B: Into<String>>(
        &self,
        bucket: B,
        policy: IamPolicy,
    ) -> SetBucketIamPolicy {
        SetBucketIamPolicy {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            policy,
        }
    }

    /// Returns the subset of `permissions` the caller has on a bucket.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// let granted = client
    ///     .test_bucket_iam_permissions("my-bucket", ["storage.buckets.get", "storage.buckets.delete"])
    ///     .send()
    ///     .await?;
    /// println!("granted permissions: {granted:?}");
    /// # Ok(()) }
    /// ```
    pub fn test_bucket_iam_permissions<B, I, P>(
        &self,
        bucket: B,
        permissions: I,
    ) -> TestBucketIamPermissions
    where
        B: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        TestBucketIamPermissions {
            common: RequestCommon::new(self.inner.clone()),
            bucket: bucket.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// The request builder for [Storage::get_bucket_iam_policy] calls.
#[derive(Clone, Debug)]
pub struct GetBucketIamPolicy {
    common: RequestCommon,
    bucket: String,
    requested_policy_version: Option<i32>,
}

request_builder!(GetBucketIamPolicy);

impl GetBucketIamPolicy {
    /// The policy format version to return.
    ///
    /// Policies with conditions require version 3.
    pub fn with_requested_policy_version(mut self, v: i32) -> Self {
        self.requested_policy_version = Some(v);
        self
    }

    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        let request = HttpRequest::new(Method::GET, format!("{}/iam", bucket_path(&self.bucket)?));
        let request = self
            .requested_policy_version
            .iter()
            .fold(request, |r, v| {
                r.with_query("optionsRequestedPolicyVersion", v.to_string())
            });
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<IamPolicy> {
        let request = self.http_request()?;
        self.common.execute(request, true).await
    }
}

/// The request builder for [Storage::set_bucket_iam_policy] calls.
///
/// The request always carries the etag of the policy it replaces, so it is
/// idempotent.
#[derive(Clone, Debug)]
pub struct SetBucketIamPolicy {
    common: RequestCommon,
    bucket: String,
    policy: IamPolicy,
}

request_builder!(SetBucketIamPolicy);

impl SetBucketIamPolicy {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        if self.policy.etag.is_none() {
            return Err(Error::binding(RequestError::MissingPolicyEtag));
        }
        if !self.policy.has_legacy_bucket_owner() {
            return Err(Error::binding(RequestError::MissingLegacyBucketOwner(
                LEGACY_BUCKET_OWNER_ROLE,
            )));
        }
        let request = HttpRequest::new(Method::PUT, format!("{}/iam", bucket_path(&self.bucket)?))
            .with_json_body(&self.policy)?;
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<IamPolicy> {
        let request = self.http_request()?;
        self.common
            .execute(request, true)
            .await
            .map_err(stale_etag_as_conflict)
    }
}

/// Reports a stale policy etag as a conflict.
///
/// The service returns 409 or 412 when the etag in the request does not match
/// the current policy. Unlike other failed preconditions, the application can
/// recover by reading the policy again and reapplying its changes.
fn stale_etag_as_conflict(error: Error) -> Error {
    let code = match error.http_status_code() {
        Some(code @ (409 | 412)) => code,
        _ => return error,
    };
    let message = error
        .status()
        .map(|s| s.message.clone())
        .unwrap_or_else(|| "the IAM policy was modified concurrently".to_string());
    let status = Status::default()
        .set_code(Code::Aborted)
        .set_message(message);
    Error::service_with_http_metadata(status, Some(code), error.http_headers().cloned())
}

/// The request builder for [Storage::test_bucket_iam_permissions] calls.
#[derive(Clone, Debug)]
pub struct TestBucketIamPermissions {
    common: RequestCommon,
    bucket: String,
    permissions: Vec<String>,
}

request_builder!(TestBucketIamPermissions);

impl TestBucketIamPermissions {
    pub(crate) fn http_request(&self) -> Result<HttpRequest> {
        if self.permissions.is_empty() {
            return Err(Error::binding(RequestError::EmptyPermissions));
        }
        let request = HttpRequest::new(
            Method::GET,
            format!("{}/iam/testPermissions", bucket_path(&self.bucket)?),
        );
        let request = self
            .permissions
            .iter()
            .fold(request, |r, p| r.with_query("permissions", p));
        self.common.decorate(request)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<Vec<String>> {
        let request = self.http_request()?;
        let response: TestIamPermissionsResponse = self.common.execute(request, true).await?;
        Ok(response.permissions)
    }
}

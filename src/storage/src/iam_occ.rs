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

//! Read-modify-write loop for bucket IAM policies.
//!
//! Bucket IAM policies are replaced as a whole, and the service rejects a
//! write if the policy changed since it was read. This module wraps the
//! read, the application changes, and the write in a loop that starts over
//! when the write is rejected because of a concurrent change.
//!
//! # Example
//! ```
//! # use bucket_admin::client::Storage;
//! # async fn sample(client: &Storage) -> anyhow::Result<()> {
//! use bucket_admin::iam_occ::{OccConfig, update_iam_policy};
//!
//! let policy = update_iam_policy(
//!     client,
//!     "my-bucket",
//!     |mut policy| {
//!         policy.add_member("roles/storage.objectViewer", "user:liz@example.com");
//!         Ok(Some(policy))
//!     },
//!     OccConfig::default(),
//! )
//! .await?;
//! # Ok(()) }
//! ```

use crate::client::Storage;
use crate::model::IamPolicy;
use crate::{Error, Result};
use gax::backoff_policy::BackoffPolicy;
use gax::error::FailureKind;
use gax::exponential_backoff::ExponentialBackoffBuilder;
use gax::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the [update_iam_policy] loop.
///
/// # Example
/// ```
/// # use bucket_admin::iam_occ::OccConfig;
/// use gax::exponential_backoff::ExponentialBackoffBuilder;
/// use std::time::Duration;
/// let backoff = ExponentialBackoffBuilder::new()
///     .with_initial_delay(Duration::from_millis(50))
///     .with_maximum_delay(Duration::from_secs(2))
///     .build()?;
/// let config = OccConfig::default()
///     .with_max_attempts(5)
///     .with_backoff_policy(backoff);
/// # Ok::<(), gax::exponential_backoff::Error>(())
/// ```
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct OccConfig {
    /// The maximum number of read-modify-write attempts.
    pub max_attempts: u32,
    /// The loop gives up once this much time has elapsed.
    pub max_duration: Duration,
    /// The delay between attempts after a conflict.
    pub backoff_policy: Arc<dyn BackoffPolicy>,
}

impl OccConfig {
    pub fn with_max_attempts(mut self, v: u32) -> Self {
        self.max_attempts = v;
        self
    }

    pub fn with_max_duration<V: Into<Duration>>(mut self, v: V) -> Self {
        self.max_duration = v.into();
        self
    }

    pub fn with_backoff_policy<V: BackoffPolicy + 'static>(mut self, v: V) -> Self {
        self.backoff_policy = Arc::new(v);
        self
    }
}

impl Default for OccConfig {
    fn default() -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_maximum_delay(Duration::from_secs(32))
            .with_scaling(2.0)
            .clamp();
        Self {
            max_attempts: 10,
            max_duration: Duration::from_secs(30),
            backoff_policy: Arc::new(backoff),
        }
    }
}

/// The IAM operations used by the loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub(crate) trait IamPolicyOperations {
    async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy>;
    async fn set_iam_policy(&self, bucket: &str, policy: IamPolicy) -> Result<IamPolicy>;
}

#[async_trait::async_trait]
impl IamPolicyOperations for Storage {
    async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy> {
        self.get_bucket_iam_policy(bucket).send().await
    }

    async fn set_iam_policy(&self, bucket: &str, policy: IamPolicy) -> Result<IamPolicy> {
        self.set_bucket_iam_policy(bucket, policy).send().await
    }
}

/// Reads the IAM policy of `bucket`, applies `updater`, and writes it back.
///
/// The updater receives the current policy, including its etag. It returns
/// the policy to write, or `None` to keep the current policy. If the write
/// fails because the policy changed concurrently the loop backs off, reads
/// the policy again, and calls `updater` on the fresh copy.
///
/// Errors other than [Conflict][FailureKind::Conflict] from the write,
/// errors reading the policy, and errors returned by `updater` end the loop
/// immediately. If the loop runs out of attempts or time, the error is
/// [exhausted][Error::is_exhausted].
pub async fn update_iam_policy<B, F>(
    client: &Storage,
    bucket: B,
    updater: F,
    config: OccConfig,
) -> Result<IamPolicy>
where
    B: Into<String>,
    F: FnMut(IamPolicy) -> Result<Option<IamPolicy>> + Send,
{
    occ_loop(client, &bucket.into(), updater, config).await
}

async fn occ_loop<C, F>(
    client: &C,
    bucket: &str,
    mut updater: F,
    config: OccConfig,
) -> Result<IamPolicy>
where
    C: IamPolicyOperations + Sync,
    F: FnMut(IamPolicy) -> Result<Option<IamPolicy>> + Send,
{
    let start = Instant::now();
    let mut attempt_count = 0_u32;
    loop {
        let current = client.get_iam_policy(bucket).await?;
        let Some(updated) = updater(current.clone())? else {
            return Ok(current);
        };
        let error = match client.set_iam_policy(bucket, updated).await {
            Ok(policy) => return Ok(policy),
            Err(e) if e.failure_kind() == FailureKind::Conflict => e,
            Err(e) => return Err(e),
        };
        attempt_count += 1;
        if attempt_count >= config.max_attempts {
            return Err(Error::exhausted(error));
        }
        let state = RetryState::new(true)
            .set_start(start)
            .set_attempt_count(attempt_count);
        let delay = config.backoff_policy.on_failure(&state);
        if start.elapsed() + delay >= config.max_duration {
            return Err(Error::exhausted(error));
        }
        tracing::debug!(
            bucket,
            attempt_count,
            ?delay,
            "IAM policy changed concurrently, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

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

//! Defines traits for retry policies and some common implementations.
//!
//! The client automatically retries requests when they fail due to transient
//! errors and the request is idempotent, that is, it is safe to perform the
//! request more than once. Requests that fail before they are sent are always
//! safe to retry.
//!
//! Applications may override the default behavior, for example, to retry
//! operations that, while not safe in general, are safe given how the
//! application manages resources.
//!
//! The policies in this module are independent of any service. Each client
//! defines the policy that decides which errors are transient.

use crate::error::Error;
use crate::retry_result::RetryResult;
use crate::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;

/// Determines how errors are handled in the retry loop.
///
/// Implementations of this trait determine if errors are retryable, and for how
/// long the retry loop may continue.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Query the retry policy after an error.
    ///
    /// # Parameters
    /// * `state` - the idempotency of the request, when the loop started, and
    ///   how many attempts were made so far.
    /// * `error` - the last error. Not all are service errors, the client may
    ///   have been unable to send the request, or to receive the response.
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;

    /// The remaining time in the retry policy.
    ///
    /// For policies based on time, this returns the remaining time in the
    /// policy. The retry loop uses this value to stop early when the next
    /// backoff would exceed the policy, and to bound the attempt timeout.
    /// For policies that are not time based this returns `None`.
    fn remaining_time(&self, _state: &RetryState) -> Option<Duration> {
        None
    }
}

/// A helper type to use [RetryPolicy] in client and request options.
#[derive(Clone, Debug)]
pub struct RetryPolicyArg(Arc<dyn RetryPolicy>);

impl RetryPolicyArg {
    /// Returns the wrapped policy.
    pub fn into_inner(self) -> Arc<dyn RetryPolicy> {
        self.0
    }
}

impl<T: RetryPolicy + 'static> std::convert::From<T> for RetryPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn RetryPolicy>> for RetryPolicyArg {
    fn from(value: Arc<dyn RetryPolicy>) -> Self {
        Self(value)
    }
}

/// Extension trait for [RetryPolicy].
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Decorate a [RetryPolicy] to limit the total elapsed time in the retry loop.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin_gax::retry_policy::*;
    /// # use bucket_admin_gax::retry_state::RetryState;
    /// # use bucket_admin_gax::error::Error;
    /// use std::time::Duration;
    /// let policy = AlwaysRetry.with_time_limit(Duration::from_secs(10));
    /// let state = RetryState::new(true).set_attempt_count(1_u32);
    /// assert!(policy.remaining_time(&state) <= Some(Duration::from_secs(10)));
    /// ```
    fn with_time_limit(self, maximum_duration: Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::custom(self, maximum_duration)
    }

    /// Decorate a [RetryPolicy] to limit the number of attempts.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin_gax::retry_policy::*;
    /// # use bucket_admin_gax::retry_state::RetryState;
    /// # use bucket_admin_gax::error::Error;
    /// let policy = AlwaysRetry.with_attempt_limit(3);
    /// let state = RetryState::new(true).set_attempt_count(3_u32);
    /// assert!(policy.on_error(&state, Error::io("transient")).is_exhausted());
    /// ```
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_attempts)
    }
}

impl<T: RetryPolicy> RetryPolicyExt for T {}

/// A retry policy that retries all errors.
///
/// This policy must be decorated to limit the number of retry attempts or the
/// duration of the retry loop. It is mostly useful in tests.
#[derive(Clone, Debug)]
pub struct AlwaysRetry;

impl RetryPolicy for AlwaysRetry {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        RetryResult::Continue(error)
    }
}

/// A retry policy that never retries.
///
/// All errors are treated as permanent. Useful for requests where the
/// application prefers to handle errors itself.
#[derive(Clone, Debug)]
pub struct NeverRetry;

impl RetryPolicy for NeverRetry {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        RetryResult::Permanent(error)
    }
}

/// A retry policy decorator that limits the total time in the retry loop.
///
/// Once the loop exceeds its duration limit, this policy returns
/// [Exhausted][RetryResult::Exhausted] for retryable errors. Before the limit
/// is reached, the policy returns the result of `P::on_error()`.
///
/// # Parameters
/// * `P` - the inner retry policy.
#[derive(Debug)]
pub struct LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_duration: Duration,
}

impl<P> LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance wrapping `inner`.
    pub fn custom(inner: P, maximum_duration: Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }

    fn on_error_now(&self, now: std::time::Instant, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if now >= state.start + self.maximum_duration => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }

    fn remaining_time_now(&self, now: std::time::Instant, state: &RetryState) -> Option<Duration> {
        let deadline = state.start + self.maximum_duration;
        let remaining = deadline.saturating_duration_since(now);
        if let Some(inner) = self.inner.remaining_time(state) {
            return Some(std::cmp::min(remaining, inner));
        }
        Some(remaining)
    }
}

impl<P> RetryPolicy for LimitedElapsedTime<P>
where
    P: RetryPolicy + 'static,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        self.on_error_now(std::time::Instant::now(), state, error)
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.remaining_time_now(std::time::Instant::now(), state)
    }
}

/// A retry policy decorator that limits the number of attempts.
///
/// Once the maximum number of attempts is reached this policy returns
/// [Exhausted][RetryResult::Exhausted] for retryable errors. Permanent errors
/// are returned as-is.
///
/// # Parameters
/// * `P` - the inner retry policy.
#[derive(Debug)]
pub struct LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_attempts: u32,
}

impl<P> LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance wrapping `inner`.
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }
}

impl<P> RetryPolicy for LimitedAttemptCount<P>
where
    P: RetryPolicy + 'static,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if state.attempt_count >= self.maximum_attempts => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.inner.remaining_time(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    mockall::mock! {
        #[derive(Debug)]
        Policy {}
        impl RetryPolicy for Policy {
            fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;
            fn remaining_time(&self, state: &RetryState) -> Option<Duration>;
        }
    }

    fn transient() -> Error {
        Error::io("connection reset")
    }

    #[test]
    fn always_retry() {
        let p = AlwaysRetry;
        let state = RetryState::new(false).set_attempt_count(100_u32);
        assert!(p.on_error(&state, transient()).is_continue());
        assert!(p.remaining_time(&state).is_none());
    }

    #[test]
    fn never_retry() {
        let p = NeverRetry;
        let state = RetryState::new(true).set_attempt_count(1_u32);
        assert!(p.on_error(&state, transient()).is_permanent());
        assert!(p.remaining_time(&state).is_none());
    }

    #[test]
    fn retry_policy_arg() {
        let arg = RetryPolicyArg::from(AlwaysRetry.with_attempt_limit(3));
        let policy = arg.into_inner();
        let state = RetryState::new(true).set_attempt_count(3_u32);
        assert!(policy.on_error(&state, transient()).is_exhausted());

        let policy: Arc<dyn RetryPolicy> = Arc::new(NeverRetry);
        let _ = RetryPolicyArg::from(policy);
    }

    #[test]
    fn limited_time_forwards() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(1)
            .returning(|_, e| RetryResult::Continue(e));
        mock.expect_remaining_time().times(1).returning(|_| None);

        let now = Instant::now();
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let state = RetryState::new(true).set_start(now).set_attempt_count(1_u32);
        let rf = policy.on_error_now(now + Duration::from_secs(10), &state, transient());
        assert!(rf.is_continue(), "{rf:?}");

        let rt = policy.remaining_time_now(now + Duration::from_secs(10), &state);
        assert_eq!(rt, Some(Duration::from_secs(50)));
    }

    #[test]
    fn limited_time_exhausted() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(1)
            .returning(|_, e| RetryResult::Continue(e));
        mock.expect_remaining_time().returning(|_| None);

        let now = Instant::now();
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let state = RetryState::new(true).set_start(now).set_attempt_count(1_u32);
        let rf = policy.on_error_now(now + Duration::from_secs(61), &state, transient());
        assert!(rf.is_exhausted(), "{rf:?}");
        let rt = policy.remaining_time_now(now + Duration::from_secs(61), &state);
        assert_eq!(rt, Some(Duration::ZERO));
    }

    #[test]
    fn limited_time_permanent() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(1)
            .returning(|_, e| RetryResult::Permanent(e));

        let now = Instant::now();
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let state = RetryState::new(true).set_start(now).set_attempt_count(1_u32);
        let rf = policy.on_error_now(now + Duration::from_secs(61), &state, transient());
        assert!(rf.is_permanent(), "{rf:?}");
    }

    #[test]
    fn limited_time_inner_remaining_time() {
        let mut mock = MockPolicy::new();
        mock.expect_remaining_time()
            .returning(|_| Some(Duration::from_secs(5)));

        let now = Instant::now();
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let state = RetryState::new(true).set_start(now);
        let rt = policy.remaining_time_now(now, &state);
        assert_eq!(rt, Some(Duration::from_secs(5)));
    }

    #[test]
    fn limited_attempt_count() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(3)
            .returning(|_, e| RetryResult::Continue(e));
        mock.expect_remaining_time()
            .times(1)
            .returning(|_| Some(Duration::from_secs(7)));

        let policy = LimitedAttemptCount::custom(mock, 3);
        let state = RetryState::new(true);
        let rf = policy.on_error(&state.clone().set_attempt_count(1_u32), transient());
        assert!(rf.is_continue(), "{rf:?}");
        let rf = policy.on_error(&state.clone().set_attempt_count(2_u32), transient());
        assert!(rf.is_continue(), "{rf:?}");
        let rf = policy.on_error(&state.clone().set_attempt_count(3_u32), transient());
        assert!(rf.is_exhausted(), "{rf:?}");
        assert_eq!(policy.remaining_time(&state), Some(Duration::from_secs(7)));
    }

    #[test]
    fn limited_attempt_count_permanent() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(1)
            .returning(|_, e| RetryResult::Permanent(e));

        let policy = LimitedAttemptCount::custom(mock, 3);
        let state = RetryState::new(true).set_attempt_count(10_u32);
        let rf = policy.on_error(&state, transient());
        assert!(rf.is_permanent(), "{rf:?}");
    }
}

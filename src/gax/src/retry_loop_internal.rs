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

use super::Result;
use super::backoff_policy::BackoffPolicy;
use super::error::Error;
use super::options::{Cancellation, RequestOptions};
use super::retry_policy::RetryPolicy;
use super::retry_result::RetryResult;
use super::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;

/// Runs the retry loop for a given function.
///
/// This functions calls an inner function as long as (1) the retry policy has
/// not expired, (2) the inner function has not returned a successful response,
/// and (3) the request has not been cancelled.
///
/// In between calls the function waits the amount of time prescribed by the
/// backoff policy, using `sleep` to implement any sleep. Both the calls and the
/// sleeps race against `cancellation`; if it triggers first the loop returns
/// an [Error::cancelled] error.
pub async fn retry_loop<F, S, Response>(
    mut inner: F,
    sleep: S,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
    cancellation: Cancellation,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> () + Send,
{
    let mut state = RetryState::new(idempotent).set_start(tokio::time::Instant::now().into_std());
    loop {
        let remaining_time = retry_policy.remaining_time(&state);
        let result = tokio::select! {
            biased;
            e = cancellation.cancelled() => return Err(e),
            r = inner(remaining_time) => r,
        };
        state.attempt_count += 1;
        let error = match result {
            Ok(r) => return Ok(r),
            Err(e) => e,
        };
        let error = match retry_policy.on_error(&state, error) {
            RetryResult::Permanent(e) => {
                tracing::debug!(attempt_count = state.attempt_count, error = %e, "permanent error");
                return Err(e);
            }
            RetryResult::Exhausted(e) => {
                tracing::debug!(attempt_count = state.attempt_count, error = %e, "retry policy exhausted");
                return Err(Error::exhausted(e));
            }
            RetryResult::Continue(e) => e,
        };
        let delay = backoff_policy.on_failure(&state);
        if retry_policy
            .remaining_time(&state)
            .is_some_and(|remaining| remaining < delay)
        {
            return Err(Error::exhausted(error));
        }
        tracing::debug!(
            attempt_count = state.attempt_count,
            ?delay,
            error = %error,
            "retrying after transient error"
        );
        tokio::select! {
            biased;
            e = cancellation.cancelled() => return Err(e),
            _ = sleep(delay) => {},
        }
    }
}

/// A helper to compute the time remaining in a retry loop, given the attempt
/// timeout and the overall timeout.
pub fn effective_timeout(
    options: &RequestOptions,
    remaining_time: Option<Duration>,
) -> Option<Duration> {
    match (options.attempt_timeout(), remaining_time) {
        (None, None) => None,
        (None, Some(t)) => Some(t),
        (Some(t), None) => Some(*t),
        (Some(a), Some(r)) => Some(*std::cmp::min(a, &r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rpc::{Code, Status};
    use std::error::Error as _;
    use test_case::test_case;
    use tokio_util::sync::CancellationToken;

    #[test_case(None, None, None)]
    #[test_case(Some(Duration::from_secs(4)), Some(Duration::from_secs(4)), None)]
    #[test_case(Some(Duration::from_secs(4)), None, Some(Duration::from_secs(4)))]
    #[test_case(
        Some(Duration::from_secs(2)),
        Some(Duration::from_secs(2)),
        Some(Duration::from_secs(4))
    )]
    #[test_case(
        Some(Duration::from_secs(2)),
        Some(Duration::from_secs(4)),
        Some(Duration::from_secs(2))
    )]
    fn effective_timeouts(
        want: Option<Duration>,
        remaining: Option<Duration>,
        request: Option<Duration>,
    ) {
        let mut options = RequestOptions::default();
        if let Some(t) = request {
            options.set_attempt_timeout(t);
        }
        let got = effective_timeout(&options, remaining);
        assert_eq!(want, got);
    }

    #[tokio::test]
    async fn immediate_success() -> anyhow::Result<()> {
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| success());
        let inner = async move |d| call.call(d);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy
            .expect_remaining_time()
            .once()
            .return_const(None);
        let backoff_policy = MockBackoffPolicy::new();
        let sleep = MockSleep::new();

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            true,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            Cancellation::default(),
        )
        .await?;
        assert_eq!(response, "success");
        Ok(())
    }

    #[tokio::test]
    async fn immediate_failure() -> anyhow::Result<()> {
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| permanent());
        let inner = async move |d| call.call(d);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy
            .expect_remaining_time()
            .once()
            .return_const(None);
        retry_policy
            .expect_on_error()
            .once()
            .returning(|_, e| RetryResult::Permanent(e));
        let backoff_policy = MockBackoffPolicy::new();
        let sleep = MockSleep::new();

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            true,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            Cancellation::default(),
        )
        .await;
        let err = response.expect_err("permanent errors are returned");
        assert_eq!(err.status().map(|s| s.code), Some(Code::PermissionDenied));
        assert!(!err.is_exhausted(), "{err:?}");
        Ok(())
    }

    #[test_case(true)]
    #[test_case(false)]
    #[tokio::test]
    async fn retry_success(expected_idempotency: bool) -> anyhow::Result<()> {
        // Two transient errors, then a successful response.
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .withf(|got| got == &Some(Duration::from_secs(3)))
            .returning(|_| transient());
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .withf(|got| got == &Some(Duration::from_secs(2)))
            .returning(|_| transient());
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .withf(|got| got == &Some(Duration::from_secs(1)))
            .returning(|_| success());
        let inner = async move |d| call.call(d);

        // Each failed attempt queries the remaining time twice: before the
        // attempt and before the backoff.
        let mut retry_seq = mockall::Sequence::new();
        let mut retry_policy = MockRetryPolicy::new();
        for secs in [3, 3, 2, 2, 1] {
            retry_policy
                .expect_remaining_time()
                .once()
                .in_sequence(&mut retry_seq)
                .return_const(Some(Duration::from_secs(secs)));
        }
        retry_policy
            .expect_on_error()
            .times(2)
            .withf(move |state, _| state.idempotent == expected_idempotency)
            .returning(|_, e| RetryResult::Continue(e));

        let mut backoff_seq = mockall::Sequence::new();
        let mut backoff_policy = MockBackoffPolicy::new();
        let mut sleep_seq = mockall::Sequence::new();
        let mut sleep = MockSleep::new();
        for d in 1..=2 {
            backoff_policy
                .expect_on_failure()
                .once()
                .in_sequence(&mut backoff_seq)
                .withf(move |state| state.attempt_count == d)
                .return_const(Duration::from_millis(d as u64));
            sleep
                .expect_sleep()
                .once()
                .in_sequence(&mut sleep_seq)
                .withf(move |got| got == &Duration::from_millis(d as u64))
                .returning(|_| Box::pin(async {}));
        }

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            expected_idempotency,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            Cancellation::default(),
        )
        .await;
        assert!(matches!(&response, Ok(s) if s == "success"), "{response:?}");
        Ok(())
    }

    #[tokio::test]
    async fn too_many_transients() -> anyhow::Result<()> {
        // The retry policy stops after the third attempt.
        const ERRORS: u32 = 3;
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        for _ in 0..ERRORS {
            call.expect_call()
                .once()
                .withf(|d| d.is_none())
                .in_sequence(&mut call_seq)
                .returning(|_| transient());
        }
        let inner = async move |d| call.call(d);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy.expect_remaining_time().return_const(None);
        retry_policy
            .expect_on_error()
            .times(ERRORS as usize)
            .returning(|state, e| {
                if state.attempt_count < ERRORS {
                    RetryResult::Continue(e)
                } else {
                    RetryResult::Exhausted(e)
                }
            });

        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .times(ERRORS as usize - 1)
            .return_const(Duration::from_millis(1));
        let mut sleep = MockSleep::new();
        sleep
            .expect_sleep()
            .times(ERRORS as usize - 1)
            .returning(|_| Box::pin(async {}));

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            true,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            Cancellation::default(),
        )
        .await;
        let err = response.expect_err("retry policy should be exhausted");
        assert!(err.is_exhausted(), "{err:?}");
        let source = err
            .source()
            .and_then(|e| e.downcast_ref::<Error>())
            .and_then(|e| e.status());
        assert_eq!(source, Some(&transient_status()));
        Ok(())
    }

    #[tokio::test]
    async fn backoff_exceeds_remaining_time() -> anyhow::Result<()> {
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| transient());
        let inner = async move |d| call.call(d);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy
            .expect_remaining_time()
            .return_const(Some(Duration::from_secs(1)));
        retry_policy
            .expect_on_error()
            .once()
            .returning(|_, e| RetryResult::Continue(e));
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .once()
            .return_const(Duration::from_secs(2));
        let sleep = MockSleep::new();

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            true,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            Cancellation::default(),
        )
        .await;
        assert!(matches!(&response, Err(e) if e.is_exhausted()), "{response:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_during_backoff() -> anyhow::Result<()> {
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| transient());
        let inner = async move |d| call.call(d);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy.expect_remaining_time().return_const(None);
        retry_policy
            .expect_on_error()
            .once()
            .returning(|_, e| RetryResult::Continue(e));
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .once()
            .return_const(Duration::from_secs(3600));

        let token = CancellationToken::new();
        let mut options = RequestOptions::default();
        options.set_cancellation_token(token.clone());
        let canceller = async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            token.cancel();
        };

        let backoff = async |d| tokio::time::sleep(d).await;
        let (response, _) = tokio::join!(
            retry_loop(
                inner,
                backoff,
                true,
                to_retry_policy(retry_policy),
                to_backoff_policy(backoff_policy),
                options.cancellation().clone(),
            ),
            canceller
        );
        let err = response.expect_err("the request should be cancelled");
        assert!(err.is_cancelled(), "{err:?}");
        assert!(!err.is_exhausted(), "{err:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_during_attempt() -> anyhow::Result<()> {
        let inner = async |_| {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            success()
        };
        let retry_policy = MockRetryPolicy::new();
        let mut retry_policy = retry_policy;
        retry_policy.expect_remaining_time().return_const(None);
        let backoff_policy = MockBackoffPolicy::new();

        let mut options = RequestOptions::default();
        options.set_deadline(tokio::time::Instant::now() + Duration::from_secs(5));
        let backoff = async |d| tokio::time::sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            true,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
            options.cancellation().clone(),
        )
        .await;
        assert!(matches!(&response, Err(e) if e.is_cancelled()), "{response:?}");
        Ok(())
    }

    fn success() -> Result<String> {
        Ok("success".into())
    }

    fn transient_status() -> Status {
        Status::default()
            .set_code(Code::Unavailable)
            .set_message("try-again")
    }

    fn transient() -> Result<String> {
        Err(Error::service(transient_status()))
    }

    fn permanent() -> Result<String> {
        let status = Status::default()
            .set_code(Code::PermissionDenied)
            .set_message("uh-oh");
        Err(Error::service(status))
    }

    fn to_retry_policy(mock: MockRetryPolicy) -> Arc<dyn RetryPolicy> {
        Arc::new(mock)
    }

    fn to_backoff_policy(mock: MockBackoffPolicy) -> Arc<dyn BackoffPolicy> {
        Arc::new(mock)
    }

    trait Call {
        fn call(&self, d: Option<Duration>) -> Result<String>;
    }

    mockall::mock! {
        Call {}
        impl Call for Call {
            fn call(&self, d: Option<Duration>) -> Result<String>;
        }
    }

    trait Sleep {
        fn sleep(&self, d: Duration) -> impl Future<Output = ()>;
    }

    mockall::mock! {
        Sleep {}
        impl Sleep for Sleep {
            fn sleep(&self, d: Duration) -> impl Future<Output = ()> + Send;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        RetryPolicy {}
        impl RetryPolicy for RetryPolicy {
            fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;
            fn remaining_time(&self, state: &RetryState) -> Option<Duration>;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        BackoffPolicy {}
        impl BackoffPolicy for BackoffPolicy {
            fn on_failure(&self, state: &RetryState) -> Duration;
        }
    }
}

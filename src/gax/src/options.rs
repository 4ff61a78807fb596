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

//! Per request options.
//!
//! While the client defaults are intended to work for most applications, it is
//! sometimes necessary to customize the behavior of some calls. Applications
//! sometimes change the timeout for a specific call, change the retry
//! configuration, or need to abandon a call when some other event happens. The
//! `*Builder` returned by each client method implements the
//! [RequestOptionsBuilder] trait where applications can override the defaults.

use crate::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use crate::error::Error;
use crate::retry_policy::{RetryPolicy, RetryPolicyArg};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A set of options configuring a single request.
///
/// Applications only use this class directly in mocks, where they may want to
/// verify their application has configured all the right request options.
///
/// All other code uses this type indirectly, via the per-request builders.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    idempotent: Option<bool>,
    attempt_timeout: Option<Duration>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    backoff_policy: Option<Arc<dyn BackoffPolicy>>,
    cancellation: Cancellation,
}

impl RequestOptions {
    /// Gets the idempotency.
    pub fn idempotent(&self) -> Option<bool> {
        self.idempotent
    }

    /// Treat the request as idempotent.
    ///
    /// The retry policy examines the idempotency and the error details to
    /// decide if the error is retryable. [Idempotent] requests are safe to
    /// retry under more error conditions than non-idempotent requests.
    ///
    /// The client provides a default idempotency for each request, based on
    /// the operation and its preconditions.
    ///
    /// [idempotent]: https://en.wikipedia.org/wiki/Idempotence
    pub fn set_idempotency(&mut self, value: bool) {
        self.idempotent = Some(value);
    }

    /// Set the idempotency for the request unless it is already set.
    ///
    /// If [set_idempotency][Self::set_idempotency] was already called this
    /// method has no effect.
    pub fn set_default_idempotency(&mut self, default: bool) {
        self.idempotent.get_or_insert(default);
    }

    /// Sets the per-attempt timeout.
    ///
    /// When using a retry loop, this affects the timeout for each attempt. The
    /// overall timeout for a request is set by the retry policy.
    pub fn set_attempt_timeout<T: Into<Duration>>(&mut self, v: T) {
        self.attempt_timeout = Some(v.into());
    }

    /// Gets the current per-attempt timeout.
    pub fn attempt_timeout(&self) -> &Option<Duration> {
        &self.attempt_timeout
    }

    /// Get the current retry policy override, if any.
    pub fn retry_policy(&self) -> &Option<Arc<dyn RetryPolicy>> {
        &self.retry_policy
    }

    /// Sets the retry policy configuration.
    pub fn set_retry_policy<V: Into<RetryPolicyArg>>(&mut self, v: V) {
        self.retry_policy = Some(v.into().into_inner());
    }

    /// Get the current backoff policy override, if any.
    pub fn backoff_policy(&self) -> &Option<Arc<dyn BackoffPolicy>> {
        &self.backoff_policy
    }

    /// Sets the backoff policy configuration.
    pub fn set_backoff_policy<V: Into<BackoffPolicyArg>>(&mut self, v: V) {
        self.backoff_policy = Some(v.into().into_inner());
    }

    /// Cancel the request when `token` is cancelled.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation.token = Some(token);
    }

    /// Cancel the request once `deadline` is reached.
    pub fn set_deadline<T: Into<tokio::time::Instant>>(&mut self, deadline: T) {
        self.cancellation.deadline = Some(deadline.into());
    }

    /// The cancellation signals for this request.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

/// The caller-supplied signals that abandon a request.
///
/// A request is cancelled when its [CancellationToken] is cancelled, or when
/// its deadline expires, whichever happens first. Requests without either
/// signal are never cancelled.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    token: Option<CancellationToken>,
    deadline: Option<tokio::time::Instant>,
}

impl Cancellation {
    /// Returns true if any of the signals has already triggered.
    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(|t| t.is_cancelled())
            || self
                .deadline
                .is_some_and(|d| d <= tokio::time::Instant::now())
    }

    /// Resolves once the request is cancelled.
    ///
    /// The returned error describes which signal triggered. The future never
    /// resolves if the request has no cancellation signals. The future holds
    /// its own copy of the signals, so it may outlive `self`.
    pub fn cancelled(&self) -> impl Future<Output = Error> + Send + 'static {
        let token = self.token.clone();
        let deadline = self.deadline;
        async move {
            match (token, deadline) {
                (None, None) => std::future::pending().await,
                (Some(token), None) => {
                    token.cancelled_owned().await;
                    Error::cancelled(CANCELLED_BY_CALLER)
                }
                (None, Some(deadline)) => {
                    tokio::time::sleep_until(deadline).await;
                    Error::cancelled(DEADLINE_EXPIRED)
                }
                (Some(token), Some(deadline)) => {
                    tokio::select! {
                        _ = token.cancelled_owned() => Error::cancelled(CANCELLED_BY_CALLER),
                        _ = tokio::time::sleep_until(deadline) => Error::cancelled(DEADLINE_EXPIRED),
                    }
                }
            }
        }
    }
}

const CANCELLED_BY_CALLER: &str = "the request was cancelled by the caller";
const DEADLINE_EXPIRED: &str = "the request deadline expired";

/// Implementations of this trait provide setters to configure request options.
///
/// The client provides a builder for each request. These builders are used
/// to set the request parameters, e.g., the name of the bucket targeted by the
/// request, as well as any options affecting the request, such as timeouts or
/// cancellation.
pub trait RequestOptionsBuilder: internal::RequestBuilder {
    /// If `v` is `true`, treat the request as idempotent.
    fn with_idempotency(self, v: bool) -> Self;

    /// Sets the per-attempt timeout.
    ///
    /// When using a retry loop, this affects the timeout for each attempt. The
    /// overall timeout for a request is set by the retry policy.
    fn with_attempt_timeout<V: Into<Duration>>(self, v: V) -> Self;

    /// Sets the retry policy configuration.
    fn with_retry_policy<V: Into<RetryPolicyArg>>(self, v: V) -> Self;

    /// Sets the backoff policy configuration.
    fn with_backoff_policy<V: Into<BackoffPolicyArg>>(self, v: V) -> Self;

    /// Abandon the request when `token` is cancelled.
    ///
    /// The request resolves with an error where
    /// [is_cancelled()][Error::is_cancelled] is true.
    fn with_cancellation(self, token: CancellationToken) -> Self;

    /// Abandon the request if it has not completed by `deadline`.
    ///
    /// The request resolves with an error where
    /// [is_cancelled()][Error::is_cancelled] is true.
    fn with_deadline<V: Into<tokio::time::Instant>>(self, deadline: V) -> Self;
}

#[doc(hidden)]
pub mod internal {
    //! This module contains implementation details. It is not part of the
    //! public API. Types and functions in this module may be changed or removed
    //! without warnings. Applications should not use any types contained
    //! within.
    use super::RequestOptions;

    /// Simplify implementation of the [super::RequestOptionsBuilder] trait in
    /// the request builders.
    pub trait RequestBuilder {
        fn request_options(&mut self) -> &mut RequestOptions;
    }
}

/// Implements the sealed [RequestOptionsBuilder] trait.
impl<T> RequestOptionsBuilder for T
where
    T: internal::RequestBuilder,
{
    fn with_idempotency(mut self, v: bool) -> Self {
        self.request_options().set_idempotency(v);
        self
    }

    fn with_attempt_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.request_options().set_attempt_timeout(v);
        self
    }

    fn with_retry_policy<V: Into<RetryPolicyArg>>(mut self, v: V) -> Self {
        self.request_options().set_retry_policy(v);
        self
    }

    fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.request_options().set_backoff_policy(v);
        self
    }

    fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.request_options().set_cancellation_token(token);
        self
    }

    fn with_deadline<V: Into<tokio::time::Instant>>(mut self, deadline: V) -> Self {
        self.request_options().set_deadline(deadline);
        self
    }
}

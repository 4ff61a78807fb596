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

use crate::transport::{DEFAULT_ENDPOINT, ReqwestTransport, Transport};
use gax::options::RequestOptions;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

/// Implements a client for the bucket metadata operations of the Cloud
/// Storage JSON API.
///
/// # Example
/// ```
/// # use bucket_admin::client::Storage;
/// # fn sample() -> anyhow::Result<()> {
/// let client = Storage::builder().build()?;
/// // use `client` to make requests to Cloud Storage.
/// # Ok(()) }
/// ```
///
/// # Configuration
///
/// To configure `Storage` use the `with_*` methods in the type returned
/// by [builder()][Storage::builder]. The default configuration should
/// work for most applications. Common configuration changes include
///
/// * [with_endpoint()]: by default this client uses the global default endpoint
///   (`https://storage.googleapis.com/storage/v1`). Applications using regional
///   endpoints or running in restricted networks may want to override this
///   default.
/// * [with_default_header()]: most buckets require authentication. The client
///   does not acquire credentials, applications provide an `Authorization`
///   header, or a custom [Transport].
///
/// # Pooling and Cloning
///
/// `Storage` holds a connection pool internally, it is advised to
/// create one and then reuse it.  You do not need to wrap `Storage` in
/// an [Rc](std::rc::Rc) or [Arc] to reuse it, because it already uses an `Arc`
/// internally.
///
/// # Service Description
///
/// Buckets are named by their id, e.g. `my-bucket`, or by their full resource
/// name, `projects/_/buckets/my-bucket`. Each bucket has access control
/// entries, default object access control entries, an IAM policy, and
/// Pub/Sub notification configurations. The client can create, read, update
/// and delete all of them.
///
/// [with_endpoint()]: ClientBuilder::with_endpoint
/// [with_default_header()]: ClientBuilder::with_default_header
#[derive(Clone, Debug)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

pub(crate) struct StorageInner {
    pub transport: Arc<dyn Transport>,
    pub options: RequestOptions,
    pub precondition_policy: PreconditionPolicy,
}

impl std::fmt::Debug for StorageInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageInner")
            .field("options", &self.options)
            .field("precondition_policy", &self.precondition_policy)
            .finish_non_exhaustive()
    }
}

impl Storage {
    /// Returns a builder for [Storage].
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// let client = Storage::builder().build()?;
    /// # Ok(()) }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new(builder: ClientBuilder) -> gax::client_builder::Result<Self> {
        tracing::info!("building Storage client with {builder:?}");
        let transport: Arc<dyn Transport> = match builder.transport {
            Some(t) => t,
            None => {
                let endpoint = builder
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
                Arc::new(ReqwestTransport::new(endpoint, builder.default_headers)?)
            }
        };
        let mut options = builder.default_options;
        if options.retry_policy().is_none() {
            options.set_retry_policy(crate::retry_policy::storage_default());
        }
        if options.backoff_policy().is_none() {
            options.set_backoff_policy(crate::backoff_policy::default());
        }
        let inner = StorageInner {
            transport,
            options,
            precondition_policy: builder.precondition_policy,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

/// Controls how the client treats updates and patches without preconditions.
///
/// Updates and patches without a match precondition may overwrite changes
/// made by other applications. They are also not idempotent, so the client
/// does not retry them after a transient failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreconditionPolicy {
    /// Updates and patches may be sent without preconditions.
    #[default]
    Optional,
    /// Updates and patches must include a match precondition, either
    /// `ifMetagenerationMatch`, `ifGenerationMatch`, or an etag. Requests
    /// without one fail before they are sent.
    RequireMatchForUpdates,
}

/// A builder for [Storage].
///
/// ```
/// # use bucket_admin::client::Storage;
/// # fn sample() -> anyhow::Result<()> {
/// let builder = Storage::builder();
/// let client = builder
///     .with_endpoint("https://storage.googleapis.com/storage/v1")
///     .build()?;
/// # Ok(()) }
/// ```
pub struct ClientBuilder {
    pub(crate) endpoint: Option<String>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) default_headers: HeaderMap,
    // Default options for requests.
    pub(crate) default_options: RequestOptions,
    pub(crate) precondition_policy: PreconditionPolicy,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Default headers often contain credentials, only print their names.
        let headers = self.default_headers.keys().collect::<Vec<_>>();
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("custom_transport", &self.transport.is_some())
            .field("default_headers", &headers)
            .field("default_options", &self.default_options)
            .field("precondition_policy", &self.precondition_policy)
            .finish()
    }
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: None,
            transport: None,
            default_headers: HeaderMap::new(),
            default_options: RequestOptions::default(),
            precondition_policy: PreconditionPolicy::default(),
        }
    }

    /// Creates a new client.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// let client = Storage::builder().build()?;
    /// # Ok(()) }
    /// ```
    pub fn build(self) -> gax::client_builder::Result<Storage> {
        Storage::new(self)
    }

    /// Sets the endpoint.
    ///
    /// Ignored if the application provides a custom transport.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// let client = Storage::builder()
    ///     .with_endpoint("https://private.googleapis.com/storage/v1")
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Replaces the transport used to send requests.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # use bucket_admin::transport::ReqwestTransport;
    /// # fn sample() -> anyhow::Result<()> {
    /// let transport = ReqwestTransport::new("http://localhost:9000/storage/v1", http::HeaderMap::new())?;
    /// let client = Storage::builder()
    ///     .with_transport(transport)
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_transport<T: Transport + 'static>(mut self, v: T) -> Self {
        self.transport = Some(Arc::new(v));
        self
    }

    /// Adds a header to every request.
    ///
    /// Ignored if the application provides a custom transport.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// let client = Storage::builder()
    ///     .with_default_header(http::header::AUTHORIZATION, "Bearer my-token".parse()?)
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Configure the retry policy.
    ///
    /// The client libraries can automatically retry operations that fail. The
    /// retry policy controls what errors are considered retryable, sets limits
    /// on the number of attempts or the time trying to make attempts.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// use bucket_admin::retry_policy::RetryableErrors;
    /// use gax::retry_policy::RetryPolicyExt;
    /// let client = Storage::builder()
    ///     .with_retry_policy(RetryableErrors.with_attempt_limit(3))
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_retry_policy<V: Into<gax::retry_policy::RetryPolicyArg>>(mut self, v: V) -> Self {
        self.default_options.set_retry_policy(v);
        self
    }

    /// Configure the retry backoff policy.
    ///
    /// The client libraries can automatically retry operations that fail. The
    /// backoff policy controls how long to wait in between retry attempts.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # fn sample() -> anyhow::Result<()> {
    /// use gax::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    /// let policy = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_millis(100))
    ///     .with_maximum_delay(Duration::from_secs(5))
    ///     .build()?;
    /// let client = Storage::builder()
    ///     .with_backoff_policy(policy)
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_backoff_policy<V: Into<gax::backoff_policy::BackoffPolicyArg>>(
        mut self,
        v: V,
    ) -> Self {
        self.default_options.set_backoff_policy(v);
        self
    }

    /// Configure the timeout for each attempt.
    ///
    /// A hung attempt fails with a timeout error, which the retry policy
    /// treats as transient.
    pub fn with_attempt_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.default_options.set_attempt_timeout(v);
        self
    }

    /// Configure the precondition policy for updates and patches.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::{PreconditionPolicy, Storage};
    /// # fn sample() -> anyhow::Result<()> {
    /// let client = Storage::builder()
    ///     .with_precondition_policy(PreconditionPolicy::RequireMatchForUpdates)
    ///     .build()?;
    /// # Ok(()) }
    /// ```
    pub fn with_precondition_policy(mut self, v: PreconditionPolicy) -> Self {
        self.precondition_policy = v;
        self
    }
}

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

use super::client::{PreconditionPolicy, StorageInner};
use crate::error::PreconditionError;
use crate::precondition::Preconditions;
use crate::transport::{HttpRequest, HttpResponse};
use crate::{Error, Result};
use gax::error::rpc::Status;
use gax::options::RequestOptions;
use gax::retry_loop_internal::effective_timeout;
use std::sync::Arc;
use std::time::Duration;

/// The state shared by all request builders.
#[derive(Clone, Debug)]
pub(crate) struct RequestCommon {
    pub inner: Arc<StorageInner>,
    pub options: RequestOptions,
    pub preconditions: Preconditions,
    pub user_project: Option<String>,
    pub fields: Option<String>,
}

impl RequestCommon {
    pub fn new(inner: Arc<StorageInner>) -> Self {
        let options = inner.options.clone();
        Self {
            inner,
            options,
            preconditions: Preconditions::default(),
            user_project: None,
            fields: None,
        }
    }

    /// Adds the preconditions and common parameters to `request`.
    ///
    /// Fails if the preconditions are inconsistent.
    pub fn decorate(&self, request: HttpRequest) -> Result<HttpRequest> {
        self.preconditions.validate().map_err(Error::binding)?;
        let request = self.preconditions.apply(request)?;
        let request = self
            .user_project
            .iter()
            .fold(request, |r, v| r.with_query("userProject", v));
        let request = self
            .fields
            .iter()
            .fold(request, |r, v| r.with_query("fields", v));
        Ok(request)
    }

    /// Enforces the client's [PreconditionPolicy] for updates and patches.
    pub fn check_update_policy(&self) -> Result<()> {
        match self.inner.precondition_policy {
            PreconditionPolicy::RequireMatchForUpdates if !self.preconditions.has_match() => Err(
                Error::binding(PreconditionError::MissingMatchPrecondition),
            ),
            _ => Ok(()),
        }
    }

    /// Updates and patches are idempotent only with a match precondition.
    pub fn update_is_idempotent(&self) -> bool {
        self.preconditions.has_match()
    }

    /// Sends `request` and decodes the response payload.
    pub async fn execute<O>(self, request: HttpRequest, idempotent: bool) -> Result<O>
    where
        O: serde::de::DeserializeOwned + Default,
    {
        let response = self.execute_raw(request, idempotent).await?;
        decode(response)
    }

    /// Sends `request` and discards any response payload.
    pub async fn execute_empty(self, request: HttpRequest, idempotent: bool) -> Result<()> {
        self.execute_raw(request, idempotent).await.map(|_| ())
    }

    async fn execute_raw(self, request: HttpRequest, idempotent: bool) -> Result<HttpResponse> {
        let mut options = self.options;
        options.set_default_idempotency(idempotent);
        self.inner.retry_loop(request, options).await
    }
}

impl StorageInner {
    async fn retry_loop(
        self: Arc<Self>,
        request: HttpRequest,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let idempotent = options.idempotent().unwrap_or(false);
        let retry_policy = options
            .retry_policy()
            .clone()
            .or_else(|| self.options.retry_policy().clone())
            .unwrap_or_else(|| Arc::new(crate::retry_policy::storage_default()));
        let backoff_policy = options
            .backoff_policy()
            .clone()
            .or_else(|| self.options.backoff_policy().clone())
            .unwrap_or_else(|| Arc::new(crate::backoff_policy::default()));
        let cancellation = options.cancellation().clone();
        let this = self;
        let inner = async move |d| this.request_attempt(request.clone(), &options, d).await;
        let sleep = async |d| tokio::time::sleep(d).await;
        gax::retry_loop_internal::retry_loop(
            inner,
            sleep,
            idempotent,
            retry_policy,
            backoff_policy,
            cancellation,
        )
        .await
    }

    async fn request_attempt(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
        remaining_time: Option<Duration>,
    ) -> Result<HttpResponse> {
        tracing::trace!(method = %request.method, path = %request.path, "sending request");
        let pending = self.transport.execute(request);
        let response = match effective_timeout(options, remaining_time) {
            None => pending.await?,
            Some(timeout) => tokio::time::timeout(timeout, pending)
                .await
                .map_err(Error::timeout)??,
        };
        if !response.is_success() {
            return Err(to_http_error(response));
        }
        Ok(response)
    }
}

/// Converts an error response into an [Error].
///
/// Responses with the standard JSON error payload become service errors, any
/// other payload is preserved in the error.
pub(crate) fn to_http_error(response: HttpResponse) -> Error {
    match Status::try_from(&response.body) {
        Ok(status) => Error::service_with_http_metadata(
            status,
            Some(response.status),
            Some(response.headers),
        ),
        Err(_) => Error::http(response.status, response.headers, response.body),
    }
}

fn decode<O: serde::de::DeserializeOwned + Default>(response: HttpResponse) -> Result<O> {
    // 204 No Content has no body and throws EOF error if we try to parse with serde::json
    if response.body.is_empty() && response.status == 204 {
        return Ok(O::default());
    }
    serde_json::from_slice(&response.body).map_err(Error::deser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::tests::{test_builder, test_client};
    use crate::transport::MockTransport;
    use gax::error::FailureKind;
    use gax::error::rpc::Code;
    use gax::options::RequestOptionsBuilder;
    use http::Method;
    use serde_json::{Value, json};

    fn common(transport: MockTransport) -> RequestCommon {
        RequestCommon::new(test_client(transport).inner)
    }

    fn get() -> HttpRequest {
        HttpRequest::new(Method::GET, "/b/b1")
    }

    fn service_error(code: u16, message: &str) -> Result<HttpResponse> {
        HttpResponse::json(code, &json!({"error": {"code": code, "message": message}}))
    }

    #[tokio::test]
    async fn success() -> anyhow::Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|r| r.method == Method::GET && r.path == "/b/b1")
            .times(1)
            .returning(|_| HttpResponse::json(200, &json!({"name": "b1"})));
        let got = common(transport).execute::<Value>(get(), true).await?;
        assert_eq!(got, json!({"name": "b1"}));
        Ok(())
    }

    #[tokio::test]
    async fn no_content() -> anyhow::Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(204)));
        let got = common(transport).execute::<Vec<String>>(get(), true).await?;
        assert!(got.is_empty(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn bad_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200).with_body("not json")));
        let err = common(transport)
            .execute::<Value>(get(), true)
            .await
            .expect_err("invalid payloads are errors");
        assert!(err.is_deserialization(), "{err:?}");
    }

    #[tokio::test]
    async fn service_error_is_parsed() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| service_error(404, "not there"));
        let err = common(transport)
            .execute::<Value>(get(), true)
            .await
            .expect_err("404 is an error");
        assert_eq!(err.failure_kind(), FailureKind::NotFound, "{err:?}");
        assert_eq!(err.http_status_code(), Some(404), "{err:?}");
        assert_eq!(err.status().map(|s| s.code), Some(Code::NotFound), "{err:?}");
        assert_eq!(
            err.status().map(|s| s.message.as_str()),
            Some("not there"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn unparsed_error_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(403).with_body("go away")));
        let err = common(transport)
            .execute::<Value>(get(), true)
            .await
            .expect_err("403 is an error");
        assert_eq!(err.failure_kind(), FailureKind::PermissionDenied, "{err:?}");
        assert_eq!(
            err.http_payload(),
            Some(&bytes::Bytes::from_static(b"go away"))
        );
    }

    #[tokio::test]
    async fn transient_then_success() -> anyhow::Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| service_error(503, "try again"));
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| HttpResponse::json(200, &json!({"name": "b1"})));
        let got = common(transport).execute::<Value>(get(), true).await?;
        assert_eq!(got, json!({"name": "b1"}));
        Ok(())
    }

    #[tokio::test]
    async fn transient_not_retried_when_not_idempotent() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| service_error(503, "try again"));
        let err = common(transport)
            .execute::<Value>(get(), false)
            .await
            .expect_err("not retried");
        assert_eq!(err.http_status_code(), Some(503), "{err:?}");
        assert!(!err.is_exhausted(), "{err:?}");
    }

    #[tokio::test]
    async fn connect_errors_retried_when_not_idempotent() -> anyhow::Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::connect("connection refused")));
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| HttpResponse::json(200, &json!({"name": "b1"})));
        let got = common(transport).execute::<Value>(get(), false).await?;
        assert_eq!(got, json!({"name": "b1"}));
        Ok(())
    }

    #[tokio::test]
    async fn exhausted() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(3)
            .returning(|_| service_error(503, "try again"));
        let err = common(transport)
            .execute::<Value>(get(), true)
            .await
            .expect_err("always fails");
        assert!(err.is_exhausted(), "{err:?}");
        assert_eq!(err.failure_kind(), FailureKind::RetriesExhausted);
    }

    #[tokio::test]
    async fn request_idempotency_overrides_default() -> anyhow::Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::io("connection reset")));
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| HttpResponse::json(200, &json!({})));
        let mut common = common(transport);
        common.options.set_idempotency(true);
        let got = common.execute::<Value>(get(), false).await?;
        assert_eq!(got, json!({}));
        Ok(())
    }

    #[derive(Debug)]
    struct Hang;

    #[async_trait::async_trait]
    impl crate::transport::Transport for Hang {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(HttpResponse::new(200))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_timeout() {
        let client = test_builder(Hang)
            .with_attempt_timeout(Duration::from_millis(10))
            .build()
            .expect("valid client");
        let err = RequestCommon::new(client.inner)
            .execute::<Value>(get(), true)
            .await
            .expect_err("always times out");
        assert!(err.is_exhausted(), "{err:?}");
    }

    #[test]
    fn decorate() -> anyhow::Result<()> {
        let mut common = common(MockTransport::new());
        common.preconditions = Preconditions::new().set_if_metageneration_match(7);
        common.user_project = Some("billing-project".into());
        common.fields = Some("name,metageneration".into());
        let request = common.decorate(get())?;
        assert_eq!(request.query_value("ifMetagenerationMatch"), Some("7"));
        assert_eq!(request.query_value("userProject"), Some("billing-project"));
        assert_eq!(request.query_value("fields"), Some("name,metageneration"));
        Ok(())
    }

    #[test]
    fn decorate_invalid_preconditions() {
        let mut common = common(MockTransport::new());
        common.preconditions = Preconditions::new()
            .set_if_generation_match(1)
            .set_if_generation_not_match(1);
        let err = common.decorate(get()).expect_err("conflicting preconditions");
        assert!(err.is_binding(), "{err:?}");
    }

    #[test]
    fn update_policy() {
        let client = test_builder(MockTransport::new())
            .with_precondition_policy(PreconditionPolicy::RequireMatchForUpdates)
            .build()
            .expect("valid client");
        let mut common = RequestCommon::new(client.inner);
        let err = common.check_update_policy().expect_err("missing precondition");
        assert!(err.is_binding(), "{err:?}");
        assert!(!common.update_is_idempotent());

        common.preconditions = Preconditions::new().set_if_etag_match("etag-1");
        assert!(common.check_update_policy().is_ok());
        assert!(common.update_is_idempotent());

        let common = RequestCommon::new(test_client(MockTransport::new()).inner);
        assert!(common.check_update_policy().is_ok());
    }

    #[test]
    fn request_options_builder() {
        struct Builder {
            common: RequestCommon,
        }
        impl gax::options::internal::RequestBuilder for Builder {
            fn request_options(&mut self) -> &mut RequestOptions {
                &mut self.common.options
            }
        }
        let builder = Builder {
            common: common(MockTransport::new()),
        }
        .with_idempotency(true)
        .with_attempt_timeout(Duration::from_secs(3));
        assert_eq!(builder.common.options.idempotent(), Some(true));
        assert_eq!(
            builder.common.options.attempt_timeout(),
            &Some(Duration::from_secs(3))
        );
    }
}

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

//! The transport used to send requests to the service.
//!
//! The client builds an [HttpRequest] for each attempt and hands it to a
//! [Transport]. The default transport, [ReqwestTransport], sends the request
//! over HTTP. Applications may provide their own transport, for example, to
//! route requests through a proxy, add authentication headers, or to test
//! their code without a network.

use crate::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

/// The default endpoint for the JSON API.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com/storage/v1";

/// A request, ready to send.
///
/// The `path` is relative to the transport endpoint, e.g. `/b/my-bucket/acl`.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Appends a query parameter.
    pub fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `body` as JSON and sets the content type.
    pub fn with_json_body<T: serde::Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let payload = serde_json::to_vec(body).map_err(Error::ser)?;
        Ok(self
            .with_header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .with_body(payload))
    }

    /// The first value of the query parameter `key`, if any.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All the values of the query parameter `key`.
    pub fn query_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The path and the percent-encoded query string.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", crate::storage::enc(k), crate::storage::enc(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// A response received from the service.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Creates a response with a JSON payload.
    pub fn json<T: serde::Serialize + ?Sized>(status: u16, body: &T) -> Result<Self> {
        let payload = serde_json::to_vec(body).map_err(Error::ser)?;
        Ok(Self::new(status)
            .with_header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .with_body(payload))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the service.
///
/// Implementations must report errors as follows:
/// - [Error::connect] if the request was never sent, e.g. the connection
///   could not be established.
/// - [Error::timeout] if the request did not complete in time.
/// - [Error::io] if the connection failed after the request was sent.
///
/// Responses with an error status code are **not** errors at this level, the
/// client interprets them.
///
/// # Example
/// ```
/// # use bucket_admin::transport::{HttpRequest, HttpResponse, Transport};
/// # use bucket_admin::Result;
/// #[derive(Debug)]
/// struct AlwaysNotFound;
///
/// #[async_trait::async_trait]
/// impl Transport for AlwaysNotFound {
///     async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse> {
///         Ok(HttpResponse::new(404))
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// A [Transport] using [reqwest].
///
/// # Example
/// ```
/// # use bucket_admin::transport::ReqwestTransport;
/// # fn sample() -> anyhow::Result<()> {
/// let mut headers = http::HeaderMap::new();
/// headers.insert(http::header::AUTHORIZATION, "Bearer my-token".parse()?);
/// let transport = ReqwestTransport::new("https://storage.googleapis.com/storage/v1", headers)?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
    default_headers: HeaderMap,
}

impl ReqwestTransport {
    /// Creates a transport sending requests to `endpoint`.
    ///
    /// `default_headers` are included in every request, unless the request
    /// sets the same header.
    pub fn new<E: Into<String>>(
        endpoint: E,
        default_headers: HeaderMap,
    ) -> gax::client_builder::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(gax::client_builder::Error::transport)?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint,
            default_headers,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(err: reqwest::Error) -> Error {
        match err {
            e if e.is_connect() => Error::connect(e),
            e if e.is_timeout() => Error::timeout(e),
            e => Error::io(e),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.endpoint, request.path_and_query());
        let mut headers = self.default_headers.clone();
        headers.extend(request.headers);
        let builder = self.client.request(request.method, url).headers(headers);
        let builder = match request.body {
            Some(body) => builder.body(body),
            None => builder,
        };
        let response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::io)?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    #[test]
    fn request_builder() -> anyhow::Result<()> {
        let request = HttpRequest::new(Method::POST, "/b")
            .with_query("project", "my-project")
            .with_query("permissions", "a.b")
            .with_query("permissions", "c.d")
            .with_json_body(&json!({"name": "b1"}))?;
        assert_eq!(request.query_value("project"), Some("my-project"));
        assert_eq!(
            request.query_values("permissions").collect::<Vec<_>>(),
            vec!["a.b", "c.d"]
        );
        assert_eq!(request.query_value("missing"), None);
        assert_eq!(
            request.headers.get(http::header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        let body = request.body.clone().unwrap_or_default();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&body)?, json!({"name": "b1"}));
        Ok(())
    }

    #[test]
    fn path_and_query() {
        let request = HttpRequest::new(Method::GET, "/b/b1");
        assert_eq!(request.path_and_query(), "/b/b1");

        let request = HttpRequest::new(Method::GET, "/b")
            .with_query("project", "p1")
            .with_query("prefix", "a b&c");
        assert_eq!(request.path_and_query(), "/b?project=p1&prefix=a%20b%26c");
    }

    #[test]
    fn response_builder() -> anyhow::Result<()> {
        let response = HttpResponse::json(200, &json!({"name": "b1"}))?;
        assert!(response.is_success());
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&response.body)?,
            json!({"name": "b1"})
        );
        assert!(!HttpResponse::new(304).is_success());
        assert!(HttpResponse::new(204).is_success());
        Ok(())
    }

    #[tokio::test]
    async fn reqwest_success() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PATCH", "/storage/v1/b/b1"),
                request::query(url_decoded(contains(("ifMetagenerationMatch", "7")))),
                request::headers(contains(("authorization", "Bearer test-token"))),
                request::headers(contains(("x-custom", "from-request"))),
                request::body(json_decoded(eq(json!({"storageClass": "COLDLINE"})))),
            ])
            .respond_with(
                status_code(200)
                    .insert_header("content-type", "application/json")
                    .body(r#"{"name": "b1", "storageClass": "COLDLINE"}"#),
            ),
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer test-token"),
        );
        headers.insert("x-custom", HeaderValue::from_static("default"));
        let transport =
            ReqwestTransport::new(format!("http://{}/storage/v1/", server.addr()), headers)?;
        assert!(transport.endpoint().ends_with("/storage/v1"), "{transport:?}");

        let request = HttpRequest::new(Method::PATCH, "/b/b1")
            .with_query("ifMetagenerationMatch", "7")
            .with_header(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("from-request"),
            )
            .with_json_body(&json!({"storageClass": "COLDLINE"}))?;
        let response = transport.execute(request).await?;
        assert_eq!(response.status, 200);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&response.body)?,
            json!({"name": "b1", "storageClass": "COLDLINE"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn reqwest_error_status_is_not_an_error() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/storage/v1/b/missing"))
                .respond_with(status_code(404).body("NOT FOUND")),
        );
        let transport =
            ReqwestTransport::new(format!("http://{}/storage/v1", server.addr()), HeaderMap::new())?;
        let response = transport
            .execute(HttpRequest::new(Method::GET, "/b/missing"))
            .await?;
        assert_eq!(response.status, 404);
        assert_eq!(response.body, Bytes::from_static(b"NOT FOUND"));
        Ok(())
    }

    #[tokio::test]
    async fn reqwest_connect_error() -> anyhow::Result<()> {
        // Find a port that is not in use.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
            listener.local_addr()?.port()
        };
        let transport =
            ReqwestTransport::new(format!("http://127.0.0.1:{port}/storage/v1"), HeaderMap::new())?;
        let err = transport
            .execute(HttpRequest::new(Method::GET, "/b/b1"))
            .await
            .expect_err("nothing listens on the port");
        assert!(err.is_connect(), "{err:?}");
        assert!(err.is_transient_and_before_rpc(), "{err:?}");
        Ok(())
    }
}

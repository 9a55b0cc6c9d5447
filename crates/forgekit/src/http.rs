//! Transport boundary between [`ForgeClient`](crate::ForgeClient) and the network.
//!
//! The client builds fully authenticated requests; a transport only moves
//! bytes. [`ReqwestTransport`] is the production implementation.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use thiserror::Error;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("forgekit/", env!("CARGO_PKG_VERSION"));

/// Methods used by the forge API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One outgoing API call. `url` already carries the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Empty means no body is sent.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// First header named `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    /// The request never produced a response (DNS, TLS, timeout, bad URL).
    #[error("{method} {url} failed: {reason}")]
    Request {
        method: HttpMethod,
        url: String,
        reason: String,
    },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Sends one request and returns the raw response, whatever its status.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// reqwest-backed transport with a per-request timeout.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: StdDuration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let failed = |e: reqwest::Error| HttpError::Request {
            method,
            url: url.clone(),
            reason: e.to_string(),
        };

        let mut builder = self.client.request(method.into(), &url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(failed)?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![("Authorization".to_string(), "token abc".to_string())],
            body: Vec::new(),
        }
    }

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let request = get("https://forge.test/api/v1/user");
        assert_eq!(request.header("authorization"), Some("token abc"));
        assert_eq!(request.header("AUTHORIZATION"), Some("token abc"));
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn test_success_is_any_2xx() {
        let response = |status| HttpResponse {
            status,
            body: Vec::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(304).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn test_methods_map_onto_reqwest() {
        assert_eq!(reqwest::Method::from(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(reqwest::Method::from(HttpMethod::Delete), reqwest::Method::DELETE);
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
    }

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("forgekit/"));
    }

    #[tokio::test]
    async fn test_mock_serves_pages_in_order_then_refuses() {
        let transport = MockTransport::new();
        let url = "https://forge.test/api/v1/repos/acme/widgets/labels?limit=50&page=1";
        transport.push_json(HttpMethod::Get, url, json!([{ "id": 1 }]));
        transport.push_json(HttpMethod::Get, url, json!([]));

        let first = transport.send(get(url)).await.expect("first page");
        let second = transport.send(get(url)).await.expect("second page");
        assert_eq!(first.body, br#"[{"id":1}]"#.to_vec());
        assert_eq!(second.body, b"[]".to_vec());

        let err = transport.send(get(url)).await.expect_err("queue drained");
        assert!(err.to_string().starts_with("GET https://forge.test/"), "{err}");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_reqwest_transport_reports_unparseable_url() {
        let transport = ReqwestTransport::new(StdDuration::from_secs(1)).expect("client");
        let err = transport
            .send(get("not a url"))
            .await
            .expect_err("relative URL cannot be sent");
        match err {
            HttpError::Request { method, url, .. } => {
                assert_eq!(method, HttpMethod::Get);
                assert_eq!(url, "not a url");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

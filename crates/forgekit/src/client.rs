//! Authenticated API client: single requests and pagination draining.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde_json::{Map, Value};

use crate::credentials::Credential;
use crate::endpoint::Endpoint;
use crate::error::{ForgeError, Result, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};
use crate::query::Query;

/// Path prefix of the REST API under the forge host.
pub const API_PREFIX: &str = "/api/v1";

/// Page size used when a caller does not pass `limit`.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Largest page size the API honours.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Node name reported in transport errors unless overridden.
pub const DEFAULT_NODE_NAME: &str = "forgekit";

/// Forge API client bound to one credential.
///
/// Works against any Gitea-compatible forge (Gitea, Forgejo, Codeberg).
#[derive(Clone)]
pub struct ForgeClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    credential: Credential,
    node_name: String,
}

impl ForgeClient {
    /// Create a new client with a reqwest transport.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use forgekit::{CODEBERG_HOST, Credential, ForgeClient};
    ///
    /// let client = ForgeClient::new(CODEBERG_HOST, Credential::AccessToken("token".into()))?;
    /// let me = client.verify_credentials().await?;
    /// ```
    pub fn new(host: &str, credential: Credential) -> Result<Self> {
        let transport = ReqwestTransport::new(StdDuration::from_secs(30))
            .map_err(|e| ForgeError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            host,
            credential,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        host: &str,
        credential: Credential,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            credential,
            node_name: DEFAULT_NODE_NAME.to_string(),
        }
    }

    /// Set the node name reported in transport errors.
    #[must_use]
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    /// Get the host URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn transport_error(&self, source: TransportError) -> ForgeError {
        ForgeError::Transport {
            node: self.node_name.clone(),
            source,
        }
    }

    fn url(&self, endpoint: &str, query: &Query) -> String {
        let mut url = format!("{}{}{}", self.host, API_PREFIX, endpoint);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_query_string());
        }
        url
    }

    /// Issue one authenticated request and parse the JSON response.
    ///
    /// An empty `body` is not sent at all. An empty 2xx response yields
    /// `Value::Null`.
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &Map<String, Value>,
        query: &Query,
    ) -> Result<Value> {
        let url = self.url(endpoint, query);

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            (
                "Authorization".to_string(),
                self.credential.authorization_header(),
            ),
        ];

        let payload = if body.is_empty() {
            Vec::new()
        } else {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            serde_json::to_vec(body).map_err(|e| self.transport_error(TransportError::Json(e)))?
        };

        tracing::debug!(method = %method, endpoint, "forge request");

        let response = self
            .transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body: payload,
            })
            .await
            .map_err(|e| self.transport_error(TransportError::Http(e.to_string())))?;

        if !response.is_success() {
            let message = String::from_utf8_lossy(&response.body).to_string();
            return Err(self.transport_error(TransportError::Status {
                status: response.status,
                message,
            }));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| self.transport_error(TransportError::Json(e)))
    }

    /// Fetch every page of a list endpoint.
    ///
    /// Pages are requested with `page` = 1, 2, ... and `limit` (from `query`,
    /// or [`DEFAULT_PAGE_SIZE`], capped at [`MAX_PAGE_SIZE`]) until a page
    /// comes back shorter than `limit`. A final page of exactly `limit` items
    /// costs one extra, empty request.
    pub async fn request_all_items(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &Map<String, Value>,
        query: &Query,
    ) -> Result<Vec<Value>> {
        let limit = match query.get("limit") {
            Some(value) => page_limit(value).ok_or_else(|| {
                ForgeError::parameter("limit", format!("expected a positive integer, got {value}"))
            })?,
            None => DEFAULT_PAGE_SIZE,
        }
        .min(MAX_PAGE_SIZE);

        let mut query = query.clone();
        query.set("limit", limit);

        let mut all_items = Vec::new();
        let mut page = 1u64;

        loop {
            query.set("page", page);
            let items = match self.request(method, endpoint, body, &query).await? {
                Value::Array(items) => items,
                other => {
                    return Err(self.transport_error(TransportError::UnexpectedShape(format!(
                        "expected an array for page {page}, got {}",
                        json_kind(&other)
                    ))));
                }
            };

            let count = items.len();
            all_items.extend(items);
            tracing::debug!(endpoint, page, count, "fetched page");

            // A short page is the last one.
            if (count as u64) < limit {
                break;
            }

            page += 1;
        }

        Ok(all_items)
    }

    /// Fetch the authenticated user; a cheap check that the credential works.
    pub async fn verify_credentials(&self) -> Result<Value> {
        self.request(
            HttpMethod::Get,
            Endpoint::User.template(),
            &Map::new(),
            &Query::new(),
        )
        .await
    }
}

impl std::fmt::Debug for ForgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeClient")
            .field("host", &self.host)
            .field("credential", &self.credential)
            .field("node_name", &self.node_name)
            .finish_non_exhaustive()
    }
}

/// Interpret a `limit` query value as a page size.
fn page_limit(value: &Value) -> Option<u64> {
    let limit = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (limit > 0).then_some(limit)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

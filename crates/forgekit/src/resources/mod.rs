//! The resource bundles and the default registry.
//!
//! Each submodule exposes `bundle()` returning its [`ResourceBundle`]. The
//! helpers here cover what most handlers share: reading owner/repo, copying
//! optional fields into a body, and shaping responses.

use serde_json::{Map, Value, json};

use crate::client::{DEFAULT_PAGE_SIZE, ForgeClient};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::Property;
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::query::{Query, build_query, set_if_defined};
use crate::record::OutputRecord;
use crate::registry::{Operation, Resource, ResourceRegistry};

pub mod branch;
pub mod comment;
pub mod file;
pub mod issue;
pub mod label;
pub mod milestone;
pub mod organization;
pub mod pull_request;
pub mod release;
pub mod repository;
pub mod user;

/// A registry holding every resource bundle.
pub fn default_registry() -> Result<ResourceRegistry> {
    let mut registry = ResourceRegistry::new();
    registry.register(repository::bundle())?;
    registry.register(issue::bundle())?;
    registry.register(pull_request::bundle())?;
    registry.register(organization::bundle())?;
    registry.register(user::bundle())?;
    registry.register(comment::bundle())?;
    registry.register(label::bundle())?;
    registry.register(milestone::bundle())?;
    registry.register(release::bundle())?;
    registry.register(branch::bundle())?;
    registry.register(file::bundle())?;
    Ok(registry)
}

/// Resolve a repository-scoped endpoint from the item's `owner` and `repo`.
pub(crate) fn repo_path(params: &ItemParameters, endpoint: Endpoint) -> Result<String> {
    let owner = params.get_str("owner")?;
    let repo = params.get_str("repo")?;
    endpoint.resolve(&[("owner", owner), ("repo", repo)])
}

/// Like [`repo_path`], with one extra placeholder.
pub(crate) fn repo_path_with(
    params: &ItemParameters,
    endpoint: Endpoint,
    key: &str,
    value: &str,
) -> Result<String> {
    let owner = params.get_str("owner")?;
    let repo = params.get_str("repo")?;
    endpoint.resolve(&[("owner", owner), ("repo", repo), (key, value)])
}

/// Copy each named field that is actually set from `source` into `body`.
pub(crate) fn copy_defined(body: &mut Map<String, Value>, source: &Map<String, Value>, keys: &[&str]) {
    for key in keys {
        set_if_defined(body, key, source.get(*key));
    }
}

/// Build a query from the named fields of `source`.
pub(crate) fn query_from(source: &Map<String, Value>, keys: &[&str]) -> Query {
    build_query(
        keys.iter()
            .map(|key| (*key, source.get(*key).cloned().unwrap_or(Value::Null))),
    )
}

/// The item's top-level `limit`, or the page-size default.
pub(crate) fn limit_or_default(params: &ItemParameters) -> Value {
    match params.get("limit") {
        None | Some(Value::Null) => json!(DEFAULT_PAGE_SIZE),
        Some(limit) => limit.clone(),
    }
}

/// Issue a request without a query string.
pub(crate) async fn send(
    client: &ForgeClient,
    method: HttpMethod,
    endpoint: &str,
    body: &Map<String, Value>,
) -> Result<Value> {
    client.request(method, endpoint, body, &Query::new()).await
}

/// GET every page of `endpoint`, one record per item.
pub(crate) async fn drain(
    client: &ForgeClient,
    endpoint: &str,
    query: &Query,
) -> Result<Vec<OutputRecord>> {
    let items = client
        .request_all_items(HttpMethod::Get, endpoint, &Map::new(), query)
        .await?;
    Ok(items.into_iter().map(OutputRecord::from_value).collect())
}

/// `"alice, bob,,"` -> `["alice", "bob"]`.
pub fn parse_comma_separated(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"1, 2, x, 3abc"` -> `[1, 2, 3]`.
///
/// Each entry contributes its leading integer, if it has one.
pub fn parse_number_list(value: &str) -> Vec<i64> {
    value.split(',').filter_map(|s| leading_integer(s.trim())).collect()
}

fn leading_integer(s: &str) -> Option<i64> {
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Set `assignees` and `labels` from their comma-separated string forms.
///
/// Only non-empty strings are converted; anything else is ignored.
pub(crate) fn apply_assignees_and_labels(body: &mut Map<String, Value>, fields: &Map<String, Value>) {
    if let Some(Value::String(assignees)) = fields.get("assignees")
        && !assignees.is_empty()
    {
        body.insert(
            "assignees".to_string(),
            json!(parse_comma_separated(assignees)),
        );
    }
    if let Some(Value::String(labels)) = fields.get("labels")
        && !labels.is_empty()
    {
        body.insert("labels".to_string(), json!(parse_number_list(labels)));
    }
}

/// The owner/repo pair shown for the given operations of `resource`.
pub(crate) fn owner_repo_fields(resource: Resource, operations: &[Operation]) -> [Property; 2] {
    [
        Property::string("owner", "Repository Owner")
            .required()
            .placeholder("e.g. my-org")
            .description("Owner of the repository")
            .show(resource, operations),
        Property::string("repo", "Repository Name")
            .required()
            .placeholder("e.g. my-repo")
            .description("Name of the repository")
            .show(resource, operations),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::Value;

    use crate::client::ForgeClient;
    use crate::credentials::Credential;
    use crate::error::Result;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, MockTransport};
    use crate::params::ItemParameters;
    use crate::record::OutputRecord;
    use crate::registry::{ItemContext, Operation, ResourceBundle};

    pub const HOST: &str = "https://forge.test";

    pub fn api(path: &str) -> String {
        format!("{HOST}/api/v1{path}")
    }

    pub fn client(transport: &MockTransport) -> ForgeClient {
        ForgeClient::new_with_transport(
            HOST,
            Credential::AccessToken("t".to_string()),
            Arc::new(transport.clone()),
        )
    }

    pub fn push_no_content(transport: &MockTransport, method: HttpMethod, path: &str) {
        transport.push_response(
            method,
            api(path),
            HttpResponse {
                status: 204,
                body: Vec::new(),
            },
        );
    }

    pub fn sent_json(request: &HttpRequest) -> Value {
        serde_json::from_slice(&request.body).expect("request body should be JSON")
    }

    /// Run one operation of `bundle` against the mock transport.
    pub async fn run(
        bundle: &ResourceBundle,
        operation: Operation,
        transport: &MockTransport,
        params: Value,
    ) -> Result<Vec<Value>> {
        let handler = bundle
            .handlers
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, handler)| *handler)
            .expect("handler should be registered");
        let client = client(transport);
        let params = ItemParameters::try_from(params).expect("params should be an object");

        let records = handler(ItemContext {
            client: &client,
            params: &params,
            index: 0,
        })
        .await?;
        Ok(records.into_iter().map(OutputRecord::into_value).collect())
    }
}

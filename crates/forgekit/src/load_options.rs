//! Dynamic option providers and list search.
//!
//! Load-option providers fill dropdowns from live API data; list-search
//! providers answer a free-text filter. Each is attached to the resource
//! bundle it belongs to and exposed by name through the registry.

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::client::{DEFAULT_PAGE_SIZE, ForgeClient};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::query::{Query, build_query};
use crate::record::unwrap_data_envelope;

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSearchEntry {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Search hits from a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListSearchResult {
    pub results: Vec<ListSearchEntry>,
}

pub type LoadOptionsFn =
    for<'a> fn(&'a ForgeClient, &'a ItemParameters) -> BoxFuture<'a, Result<Vec<OptionEntry>>>;

pub type ListSearchFn =
    for<'a> fn(&'a ForgeClient, Option<&'a str>) -> BoxFuture<'a, Result<ListSearchResult>>;

/// Owner and repository the current parameters point at, if both are set.
fn repo_scope(params: &ItemParameters) -> Option<(&str, &str)> {
    let non_empty = |name: &str| {
        params
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };
    let owner = non_empty("owner")?;
    let repo = non_empty("repositoryName").or_else(|| non_empty("repo"))?;
    Some((owner, repo))
}

/// Map every array element carrying `name_key` to an option.
///
/// Non-array responses yield no options.
fn to_options(response: Value, name_key: &str, value_key: &str) -> Vec<OptionEntry> {
    let Value::Array(items) = response else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| {
            let name = item.get(name_key)?.as_str()?.to_string();
            let value = item.get(value_key)?.clone();
            Some(OptionEntry { name, value })
        })
        .collect()
}

async fn get(client: &ForgeClient, endpoint: &str) -> Result<Value> {
    client
        .request(HttpMethod::Get, endpoint, &Map::new(), &Query::new())
        .await
}

async fn repo_options(
    client: &ForgeClient,
    params: &ItemParameters,
    endpoint: Endpoint,
    name_key: &str,
    value_key: &str,
) -> Result<Vec<OptionEntry>> {
    let Some((owner, repo)) = repo_scope(params) else {
        return Ok(Vec::new());
    };
    let path = endpoint.resolve(&[("owner", owner), ("repo", repo)])?;
    Ok(to_options(get(client, &path).await?, name_key, value_key))
}

pub fn get_repositories<'a>(
    client: &'a ForgeClient,
    _params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(async move {
        let response = get(client, Endpoint::UserRepos.template()).await?;
        Ok(to_options(response, "full_name", "full_name"))
    })
}

pub fn get_organizations<'a>(
    client: &'a ForgeClient,
    _params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(async move {
        let response = get(client, Endpoint::UserOrgs.template()).await?;
        Ok(to_options(response, "username", "username"))
    })
}

pub fn get_labels<'a>(
    client: &'a ForgeClient,
    params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(repo_options(client, params, Endpoint::Labels, "name", "id"))
}

pub fn get_milestones<'a>(
    client: &'a ForgeClient,
    params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(repo_options(client, params, Endpoint::Milestones, "title", "id"))
}

pub fn get_branches<'a>(
    client: &'a ForgeClient,
    params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(repo_options(client, params, Endpoint::Branches, "name", "name"))
}

pub fn get_users<'a>(
    client: &'a ForgeClient,
    params: &'a ItemParameters,
) -> BoxFuture<'a, Result<Vec<OptionEntry>>> {
    Box::pin(repo_options(
        client,
        params,
        Endpoint::RepoAssignees,
        "login",
        "login",
    ))
}

async fn search(
    client: &ForgeClient,
    endpoint: Endpoint,
    filter: Option<&str>,
    name_key: &str,
) -> Result<ListSearchResult> {
    let query = build_query([
        ("q", json!(filter.unwrap_or_default())),
        ("limit", json!(DEFAULT_PAGE_SIZE)),
    ]);
    let response = client
        .request(HttpMethod::Get, endpoint.template(), &Map::new(), &query)
        .await?;

    let Value::Array(items) = unwrap_data_envelope(response) else {
        return Ok(ListSearchResult::default());
    };
    let results = items
        .into_iter()
        .filter_map(|item| {
            let name = item.get(name_key)?.as_str()?.to_string();
            let url = item
                .get("html_url")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(ListSearchEntry {
                value: Value::String(name.clone()),
                name,
                url,
            })
        })
        .collect();

    Ok(ListSearchResult { results })
}

pub fn search_repositories<'a>(
    client: &'a ForgeClient,
    filter: Option<&'a str>,
) -> BoxFuture<'a, Result<ListSearchResult>> {
    Box::pin(search(client, Endpoint::ReposSearch, filter, "full_name"))
}

pub fn search_users<'a>(
    client: &'a ForgeClient,
    filter: Option<&'a str>,
) -> BoxFuture<'a, Result<ListSearchResult>> {
    Box::pin(search(client, Endpoint::UsersSearch, filter, "login"))
}

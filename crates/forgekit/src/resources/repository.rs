//! Repository operations.

use serde_json::{Map, json};

use super::{copy_defined, limit_or_default, query_from, repo_path, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::{get_repositories, search_repositories};
use crate::query::build_query;
use crate::record::{OutputRecord, records_from_response, unwrap_data_envelope};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Repository;

const CREATE_FIELDS: &[&str] = &[
    "description",
    "private",
    "auto_init",
    "gitignores",
    "license",
    "default_branch",
    "readme",
];

const UPDATE_FIELDS: &[&str] = &[
    "name",
    "description",
    "private",
    "default_branch",
    "website",
    "has_issues",
    "has_pull_requests",
    "has_wiki",
];

const ORDER: &[(&str, &str)] = &[("Ascending", "asc"), ("Descending", "desc")];

fn fields() -> Vec<Property> {
    let scoped = [Operation::Get, Operation::Update, Operation::Delete, Operation::Fork];
    vec![
        Property::string("owner", "Owner").required().show(R, &scoped),
        Property::string("repo", "Repository Name")
            .required()
            .show(R, &scoped),
        Property::string("name", "Name")
            .required()
            .show(R, &[Operation::Create]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::boolean("auto_init", "Auto Init", false),
                Property::string("default_branch", "Default Branch").default_value("main"),
                Property::string("description", "Description"),
                Property::string("gitignores", "Gitignores"),
                Property::string("license", "License"),
                Property::boolean("private", "Private", false),
                Property::string("readme", "README"),
            ],
        )
        .show(R, &[Operation::Create]),
        Property::collection(
            "updateFields",
            "Update Fields",
            vec![
                Property::string("default_branch", "Default Branch"),
                Property::string("description", "Description"),
                Property::boolean("has_issues", "Has Issues", true),
                Property::boolean("has_pull_requests", "Has Pull Requests", true),
                Property::boolean("has_wiki", "Has Wiki", true),
                Property::string("name", "Name"),
                Property::boolean("private", "Private", false),
                Property::string("website", "Website"),
            ],
        )
        .show(R, &[Operation::Update]),
        Property::string("query", "Query")
            .required()
            .show(R, &[Operation::Search]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
                Property::options("order", "Order", ORDER, "desc"),
                Property::options(
                    "sort",
                    "Sort",
                    &[
                        ("Created", "created"),
                        ("Forks", "forks"),
                        ("Size", "size"),
                        ("Stars", "stars"),
                        ("Updated", "updated"),
                    ],
                    "updated",
                ),
            ],
        )
        .show(R, &[Operation::Search]),
        Property::number("limit", "Limit", DEFAULT_PAGE_SIZE).show(R, &[Operation::List]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![Property::string("organization", "Organization")],
        )
        .show(R, &[Operation::Fork]),
    ]
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let name = ctx.params.get_str("name")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));
        copy_defined(&mut body, &additional, CREATE_FIELDS);

        let response = send(
            ctx.client,
            HttpMethod::Post,
            Endpoint::RepoCreateUser.template(),
            &body,
        )
        .await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Repo)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Repo)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(&mut body, &changes, UPDATE_FIELDS);

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Repo)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn search(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let q = ctx.params.get_str("query")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut query = query_from(&additional, &["sort", "order", "limit"]);
        if !q.is_empty() {
            query.set("q", q);
        }

        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                Endpoint::ReposSearch.template(),
                &Map::new(),
                &query,
            )
            .await?;
        Ok(records_from_response(unwrap_data_envelope(response)))
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let query = build_query([("limit", limit_or_default(ctx.params))]);
        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                Endpoint::UserRepos.template(),
                &Map::new(),
                &query,
            )
            .await?;
        Ok(records_from_response(response))
    })
}

fn fork(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::RepoForks)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        copy_defined(&mut body, &additional, &["organization"]);

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a repository"),
                (Operation::Delete, "Delete a repository"),
                (Operation::Fork, "Fork a repository"),
                (Operation::Get, "Get a repository"),
                (Operation::List, "List repositories"),
                (Operation::Search, "Search repositories"),
                (Operation::Update, "Update a repository"),
            ],
            Operation::Get,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::Search, search)
        .with_handler(Operation::List, list)
        .with_handler(Operation::Fork, fork)
        .with_load_options("getRepositories", get_repositories)
        .with_list_search("searchRepositories", search_repositories)
}

use serde_json::{Map, json};

use super::{copy_defined, limit_or_default, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::get_organizations;
use crate::params::ItemParameters;
use crate::query::build_query;
use crate::record::{OutputRecord, records_from_response};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Organization;

const PROFILE_FIELDS: &[&str] = &["full_name", "description", "website", "location", "visibility"];

fn profile() -> Vec<Property> {
    vec![
        Property::string("description", "Description"),
        Property::string("full_name", "Full Name"),
        Property::string("location", "Location"),
        Property::options(
            "visibility",
            "Visibility",
            &[
                ("Limited", "limited"),
                ("Private", "private"),
                ("Public", "public"),
            ],
            "public",
        ),
        Property::string("website", "Website"),
    ]
}

fn fields() -> Vec<Property> {
    vec![
        Property::string("orgName", "Organization Name").required().show(
            R,
            &[
                Operation::Get,
                Operation::Update,
                Operation::Delete,
                Operation::ListMembers,
            ],
        ),
        Property::string("username", "Username")
            .required()
            .description("The organization's unique name")
            .show(R, &[Operation::Create]),
        Property::collection("additionalFields", "Additional Fields", profile())
            .show(R, &[Operation::Create]),
        Property::collection("updateFields", "Update Fields", profile())
            .show(R, &[Operation::Update]),
        Property::number("limit", "Limit", DEFAULT_PAGE_SIZE)
            .show(R, &[Operation::List, Operation::ListMembers]),
    ]
}

fn org_path(params: &ItemParameters, endpoint: Endpoint) -> Result<String> {
    let org = params.get_str("orgName")?;
    endpoint.resolve(&[("owner", org)])
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let username = ctx.params.get_str("username")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("username".to_string(), json!(username));
        copy_defined(&mut body, &additional, PROFILE_FIELDS);

        let response = send(ctx.client, HttpMethod::Post, Endpoint::Orgs.template(), &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = org_path(ctx.params, Endpoint::Org)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = org_path(ctx.params, Endpoint::Org)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(&mut body, &changes, PROFILE_FIELDS);

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = org_path(ctx.params, Endpoint::Org)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let query = build_query([("limit", limit_or_default(ctx.params))]);
        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                Endpoint::UserOrgs.template(),
                &Map::new(),
                &query,
            )
            .await?;
        Ok(records_from_response(response))
    })
}

fn list_members(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = org_path(ctx.params, Endpoint::OrgMembers)?;
        let query = build_query([("limit", limit_or_default(ctx.params))]);
        let response = ctx
            .client
            .request(HttpMethod::Get, &endpoint, &Map::new(), &query)
            .await?;
        Ok(records_from_response(response))
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create an organization"),
                (Operation::Delete, "Delete an organization"),
                (Operation::Get, "Get an organization"),
                (Operation::List, "List organizations"),
                (Operation::ListMembers, "List organization members"),
                (Operation::Update, "Update an organization"),
            ],
            Operation::Get,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
        .with_handler(Operation::ListMembers, list_members)
        .with_load_options("getOrganizations", get_organizations)
}

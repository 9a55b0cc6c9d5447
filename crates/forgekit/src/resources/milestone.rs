use serde_json::{Map, json};

use super::{copy_defined, drain, owner_repo_fields, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::get_milestones;
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Milestone;

const OPERATIONS: [Operation; 5] = [
    Operation::Create,
    Operation::Get,
    Operation::Update,
    Operation::Delete,
    Operation::List,
];

const STATE: &[(&str, &str)] = &[("Closed", "closed"), ("Open", "open")];

fn details() -> Vec<Property> {
    vec![
        Property::string("description", "Description"),
        Property::date_time("due_on", "Due On"),
        Property::options("state", "State", STATE, "open"),
    ]
}

fn fields() -> Vec<Property> {
    let mut update = details();
    update.push(Property::string("title", "Title"));

    let mut fields = Vec::from(owner_repo_fields(R, &OPERATIONS));
    fields.extend([
        Property::string("title", "Title")
            .required()
            .show(R, &[Operation::Create]),
        Property::collection("additionalFields", "Additional Fields", details())
            .show(R, &[Operation::Create]),
        Property::number("milestoneId", "Milestone ID", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Delete]),
        Property::collection("updateFields", "Update Fields", update).show(R, &[Operation::Update]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
                Property::options(
                    "state",
                    "State",
                    &[("All", "all"), ("Closed", "closed"), ("Open", "open")],
                    "open",
                ),
            ],
        )
        .show(R, &[Operation::List]),
    ]);
    fields
}

fn milestone_path(params: &ItemParameters) -> Result<String> {
    let id = params.get_id_string("milestoneId")?;
    repo_path_with(params, Endpoint::Milestone, "id", &id)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Milestones)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("title".to_string(), json!(ctx.params.get_str("title")?));
        copy_defined(&mut body, &additional, &["description", "state", "due_on"]);

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = milestone_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = milestone_path(ctx.params)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(
            &mut body,
            &changes,
            &["title", "description", "state", "due_on"],
        );

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = milestone_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Milestones)?;
        let additional = ctx.params.collection("additionalFields")?;
        let query = query_from(&additional, &["state", "limit"]);
        drain(ctx.client, &endpoint, &query).await
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a milestone"),
                (Operation::Delete, "Delete a milestone"),
                (Operation::Get, "Get a milestone"),
                (Operation::List, "List milestones"),
                (Operation::Update, "Update a milestone"),
            ],
            Operation::Create,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
        .with_load_options("getMilestones", get_milestones)
}

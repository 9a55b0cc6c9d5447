use serde_json::{Map, json};

use super::{copy_defined, drain, owner_repo_fields, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::get_labels;
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Label;

const OPERATIONS: [Operation; 5] = [
    Operation::Create,
    Operation::Get,
    Operation::Update,
    Operation::Delete,
    Operation::List,
];

fn fields() -> Vec<Property> {
    let mut fields = Vec::from(owner_repo_fields(R, &OPERATIONS));
    fields.extend([
        Property::string("name", "Name")
            .required()
            .placeholder("e.g. bug")
            .show(R, &[Operation::Create]),
        Property::color("color", "Color")
            .required()
            .placeholder("e.g. ee0701")
            .description("Hex color without the leading #")
            .show(R, &[Operation::Create]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::string("description", "Description"),
                Property::boolean("exclusive", "Exclusive", false)
                    .description("Only one label with the same scope prefix can be set"),
            ],
        )
        .show(R, &[Operation::Create]),
        Property::number("labelId", "Label ID", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Delete]),
        Property::collection(
            "updateFields",
            "Update Fields",
            vec![
                Property::color("color", "Color"),
                Property::string("description", "Description"),
                Property::boolean("exclusive", "Exclusive", false),
                Property::string("name", "Name"),
            ],
        )
        .show(R, &[Operation::Update]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![Property::number("limit", "Limit", DEFAULT_PAGE_SIZE)],
        )
        .show(R, &[Operation::List]),
    ]);
    fields
}

fn label_path(params: &ItemParameters) -> Result<String> {
    let id = params.get_id_string("labelId")?;
    repo_path_with(params, Endpoint::Label, "id", &id)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Labels)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("name".to_string(), json!(ctx.params.get_str("name")?));
        body.insert("color".to_string(), json!(ctx.params.get_str("color")?));
        copy_defined(&mut body, &additional, &["description", "exclusive"]);

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = label_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = label_path(ctx.params)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(
            &mut body,
            &changes,
            &["name", "color", "description", "exclusive"],
        );

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = label_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Labels)?;
        let additional = ctx.params.collection("additionalFields")?;
        drain(ctx.client, &endpoint, &query_from(&additional, &["limit"])).await
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a label"),
                (Operation::Delete, "Delete a label"),
                (Operation::Get, "Get a label"),
                (Operation::List, "List labels"),
                (Operation::Update, "Update a label"),
            ],
            Operation::Create,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
        .with_load_options("getLabels", get_labels)
}

use serde_json::{Map, json};

use super::{drain, owner_repo_fields, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::get_branches;
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Branch;

const OPERATIONS: [Operation; 4] = [
    Operation::Create,
    Operation::Get,
    Operation::Delete,
    Operation::List,
];

fn fields() -> Vec<Property> {
    let mut fields = Vec::from(owner_repo_fields(R, &OPERATIONS));
    fields.extend([
        Property::string("newBranchName", "New Branch Name")
            .required()
            .placeholder("e.g. feature/my-feature")
            .show(R, &[Operation::Create]),
        Property::string("oldBranchName", "Source Branch")
            .required()
            .placeholder("e.g. main")
            .description("The branch to create the new branch from")
            .show(R, &[Operation::Create]),
        Property::string("branchName", "Branch Name")
            .required()
            .show(R, &[Operation::Get, Operation::Delete]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![Property::number("limit", "Limit", DEFAULT_PAGE_SIZE)],
        )
        .show(R, &[Operation::List]),
    ]);
    fields
}

/// Branch names land in a single path segment and are validated like any
/// other placeholder, so names containing `/` are rejected here.
fn branch_path(params: &ItemParameters) -> Result<String> {
    let branch = params.get_str("branchName")?;
    repo_path_with(params, Endpoint::Branch, "branch", branch)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Branches)?;

        let mut body = Map::new();
        body.insert(
            "new_branch_name".to_string(),
            json!(ctx.params.get_str("newBranchName")?),
        );
        body.insert(
            "old_branch_name".to_string(),
            json!(ctx.params.get_str("oldBranchName")?),
        );

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = branch_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = branch_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Branches)?;
        let additional = ctx.params.collection("additionalFields")?;
        drain(ctx.client, &endpoint, &query_from(&additional, &["limit"])).await
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a branch"),
                (Operation::Delete, "Delete a branch"),
                (Operation::Get, "Get a branch"),
                (Operation::List, "List branches"),
            ],
            Operation::List,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
        .with_load_options("getBranches", get_branches)
}

use serde_json::{Map, Value, json};

use super::{apply_assignees_and_labels, copy_defined, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::record::{OutputRecord, records_from_response};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::PullRequest;

fn fields() -> Vec<Property> {
    let shared = || {
        vec![
            Property::string("assignees", "Assignees"),
            Property::string("body", "Body"),
            Property::string("labels", "Labels"),
            Property::number("milestone", "Milestone", 0),
        ]
    };
    let mut update = shared();
    update.insert(1, Property::string("base", "Base Branch"));
    update.push(Property::options(
        "state",
        "State",
        &[("Closed", "closed"), ("Open", "open")],
        "open",
    ));
    update.push(Property::string("title", "Title"));

    let scoped = [
        Operation::Create,
        Operation::Get,
        Operation::Update,
        Operation::List,
        Operation::Merge,
    ];

    vec![
        Property::string("owner", "Owner").required().show(R, &scoped),
        Property::string("repo", "Repository Name")
            .required()
            .show(R, &scoped),
        Property::number("pullNumber", "Pull Request Number", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Merge]),
        Property::string("title", "Title")
            .required()
            .show(R, &[Operation::Create]),
        Property::string("head", "Head Branch")
            .required()
            .show(R, &[Operation::Create]),
        Property::string("base", "Base Branch")
            .required()
            .show(R, &[Operation::Create]),
        Property::collection("additionalFields", "Additional Fields", shared())
            .show(R, &[Operation::Create]),
        Property::collection("updateFields", "Update Fields", update).show(R, &[Operation::Update]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::string("labels", "Labels"),
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
                Property::string("milestone", "Milestone"),
                Property::options(
                    "sort",
                    "Sort",
                    &[
                        ("Created", "created"),
                        ("Oldest", "oldest"),
                        ("Priority", "priority"),
                        ("Updated", "updated"),
                    ],
                    "created",
                ),
                Property::options(
                    "state",
                    "State",
                    &[("All", "all"), ("Closed", "closed"), ("Open", "open")],
                    "open",
                ),
            ],
        )
        .show(R, &[Operation::List]),
        Property::options(
            "mergeMethod",
            "Merge Method",
            &[("Merge", "merge"), ("Rebase", "rebase"), ("Squash", "squash")],
            "merge",
        )
        .required()
        .show(R, &[Operation::Merge]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::boolean("delete_branch_after_merge", "Delete Branch After Merge", false),
                Property::string("merge_message_field", "Merge Commit Message"),
                Property::string("merge_title_field", "Merge Title"),
            ],
        )
        .show(R, &[Operation::Merge]),
    ]
}

fn pull_path(params: &ItemParameters, endpoint: Endpoint) -> Result<String> {
    let number = params.get_id_string("pullNumber")?;
    repo_path_with(params, endpoint, "index", &number)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Pulls)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        for key in ["title", "head", "base"] {
            body.insert(key.to_string(), json!(ctx.params.get_str(key)?));
        }
        copy_defined(&mut body, &additional, &["body", "milestone"]);
        apply_assignees_and_labels(&mut body, &additional);

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = pull_path(ctx.params, Endpoint::Pull)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = pull_path(ctx.params, Endpoint::Pull)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(
            &mut body,
            &changes,
            &["title", "body", "state", "base", "milestone"],
        );
        apply_assignees_and_labels(&mut body, &changes);

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Pulls)?;
        let additional = ctx.params.collection("additionalFields")?;
        let query = query_from(
            &additional,
            &["state", "sort", "labels", "milestone", "limit"],
        );

        let response = ctx
            .client
            .request(HttpMethod::Get, &endpoint, &Map::new(), &query)
            .await?;
        Ok(records_from_response(response))
    })
}

fn merge(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = pull_path(ctx.params, Endpoint::PullMerge)?;
        let method = ctx.params.get_str("mergeMethod")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("Do".to_string(), json!(method));
        copy_defined(
            &mut body,
            &additional,
            &[
                "merge_message_field",
                "merge_title_field",
                "delete_branch_after_merge",
            ],
        );

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        // Merges usually answer with an empty body.
        let record = match response {
            Value::Null | Value::Bool(false) => OutputRecord::success(),
            Value::String(ref s) if s.is_empty() => OutputRecord::success(),
            other => OutputRecord::from_value(other),
        };
        Ok(vec![record])
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a pull request"),
                (Operation::Get, "Get a pull request"),
                (Operation::List, "List pull requests"),
                (Operation::Merge, "Merge a pull request"),
                (Operation::Update, "Update a pull request"),
            ],
            Operation::Get,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::List, list)
        .with_handler(Operation::Merge, merge)
}

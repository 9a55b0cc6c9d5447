use serde_json::{Map, json};

use super::{copy_defined, drain, owner_repo_fields, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Release;

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
        Property::string("tagName", "Tag Name")
            .required()
            .placeholder("e.g. v1.0.0")
            .show(R, &[Operation::Create]),
        Property::string("name", "Release Name")
            .required()
            .show(R, &[Operation::Create]),
        Property::string("body", "Body")
            .description("Release notes")
            .show(R, &[Operation::Create]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::boolean("draft", "Draft", false),
                Property::boolean("prerelease", "Prerelease", false),
                Property::string("target_commitish", "Target Commitish")
                    .description("Branch or commit the tag is created from"),
            ],
        )
        .show(R, &[Operation::Create]),
        Property::number("releaseId", "Release ID", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Delete]),
        Property::collection(
            "updateFields",
            "Update Fields",
            vec![
                Property::string("body", "Body"),
                Property::boolean("draft", "Draft", false),
                Property::string("name", "Name"),
                Property::boolean("prerelease", "Prerelease", false),
                Property::string("tag_name", "Tag Name"),
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

fn release_path(params: &ItemParameters) -> Result<String> {
    let id = params.get_id_string("releaseId")?;
    repo_path_with(params, Endpoint::Release, "id", &id)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Releases)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("tag_name".to_string(), json!(ctx.params.get_str("tagName")?));
        body.insert("name".to_string(), json!(ctx.params.get_str("name")?));
        body.insert(
            "body".to_string(),
            json!(ctx.params.get_string_or("body", "")?),
        );
        copy_defined(
            &mut body,
            &additional,
            &["draft", "prerelease", "target_commitish"],
        );

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = release_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = release_path(ctx.params)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(
            &mut body,
            &changes,
            &["tag_name", "name", "body", "draft", "prerelease"],
        );

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = release_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Releases)?;
        let additional = ctx.params.collection("additionalFields")?;
        drain(ctx.client, &endpoint, &query_from(&additional, &["limit"])).await
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a release"),
                (Operation::Delete, "Delete a release"),
                (Operation::Get, "Get a release"),
                (Operation::List, "List releases"),
                (Operation::Update, "Update a release"),
            ],
            Operation::Create,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;
    use crate::resources::test_support::{api, run, sent_json};

    #[tokio::test]
    async fn test_create_maps_tag_name() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            api("/repos/acme/widgets/releases"),
            json!({ "id": 11 }),
        );

        run(
            &bundle(),
            Operation::Create,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "tagName": "v1.0.0",
                "name": "First",
                "additionalFields": { "prerelease": true, "target_commitish": "" }
            }),
        )
        .await
        .expect("create");
        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({ "tag_name": "v1.0.0", "name": "First", "body": "", "prerelease": true })
        );
    }

    #[tokio::test]
    async fn test_update_keeps_false_draft() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Patch,
            api("/repos/acme/widgets/releases/11"),
            json!({ "id": 11 }),
        );

        run(
            &bundle(),
            Operation::Update,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "releaseId": 11,
                "updateFields": { "draft": false, "name": null }
            }),
        )
        .await
        .expect("update");
        assert_eq!(sent_json(&transport.requests()[0]), json!({ "draft": false }));
    }

    #[tokio::test]
    async fn test_list_drains_until_short_page() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/releases?limit=1&page=1"),
            json!([{ "id": 1 }]),
        );
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/releases?limit=1&page=2"),
            json!([]),
        );

        let out = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "additionalFields": { "limit": 1 } }),
        )
        .await
        .expect("list");
        assert_eq!(out, vec![json!({ "id": 1 })]);
    }
}

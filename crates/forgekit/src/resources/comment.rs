use serde_json::{Map, Value, json};

use super::{drain, owner_repo_fields, query_from, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Comment;

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
        Property::number("issueNumber", "Issue Number", 0)
            .required()
            .description("The issue the comments belong to")
            .show(R, &[Operation::Create, Operation::List]),
        Property::number("commentId", "Comment ID", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Delete]),
        Property::string("body", "Body")
            .required()
            .description("The content of the comment")
            .show(R, &[Operation::Create, Operation::Update]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::date_time("since", "Since")
                    .description("Only show comments updated after the given time"),
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
            ],
        )
        .show(R, &[Operation::List]),
    ]);
    fields
}

fn comment_path(params: &ItemParameters) -> Result<String> {
    let id = params.get_id_string("commentId")?;
    repo_path_with(params, Endpoint::IssueComment, "id", &id)
}

fn comments_path(params: &ItemParameters) -> Result<String> {
    let number = params.get_id_string("issueNumber")?;
    repo_path_with(params, Endpoint::IssueComments, "index", &number)
}

fn body_of(params: &ItemParameters) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    body.insert("body".to_string(), json!(params.get_str("body")?));
    Ok(body)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = comments_path(ctx.params)?;
        let body = body_of(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = comment_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = comment_path(ctx.params)?;
        let body = body_of(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = comment_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = comments_path(ctx.params)?;
        let additional = ctx.params.collection("additionalFields")?;
        let query = query_from(&additional, &["since", "limit"]);
        drain(ctx.client, &endpoint, &query).await
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create a comment"),
                (Operation::Delete, "Delete a comment"),
                (Operation::Get, "Get a comment"),
                (Operation::List, "List comments"),
                (Operation::Update, "Update a comment"),
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
    use crate::error::ForgeError;
    use crate::http::MockTransport;
    use crate::resources::test_support::{api, push_no_content, run, sent_json};

    #[tokio::test]
    async fn test_create_posts_body_to_issue() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            api("/repos/acme/widgets/issues/7/comments"),
            json!({ "id": 100 }),
        );

        let out = run(
            &bundle(),
            Operation::Create,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "issueNumber": 7, "body": "LGTM" }),
        )
        .await
        .expect("create");
        assert_eq!(out, vec![json!({ "id": 100 })]);
        assert_eq!(sent_json(&transport.requests()[0]), json!({ "body": "LGTM" }));
    }

    #[tokio::test]
    async fn test_update_requires_body() {
        let transport = MockTransport::new();
        let err = run(
            &bundle(),
            Operation::Update,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "commentId": 100 }),
        )
        .await
        .expect_err("no body");
        assert!(matches!(err, ForgeError::Parameter { ref name, .. } if name == "body"));
    }

    #[tokio::test]
    async fn test_delete_uses_comment_id() {
        let transport = MockTransport::new();
        push_no_content(
            &transport,
            HttpMethod::Delete,
            "/repos/acme/widgets/issues/comments/100",
        );

        let out = run(
            &bundle(),
            Operation::Delete,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "commentId": 100 }),
        )
        .await
        .expect("delete");
        assert_eq!(out, vec![json!({ "success": true })]);
    }

    #[tokio::test]
    async fn test_list_drains_every_page() {
        let transport = MockTransport::new();
        let page = |n: usize| Value::Array((0..n).map(|i| json!({ "id": i })).collect());
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/issues/7/comments?limit=2&page=1"),
            page(2),
        );
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/issues/7/comments?limit=2&page=2"),
            page(1),
        );

        let out = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "issueNumber": 7,
                "additionalFields": { "limit": 2, "since": "" }
            }),
        )
        .await
        .expect("list");
        assert_eq!(out.len(), 3);
        assert_eq!(transport.requests().len(), 2);
    }
}

use serde_json::{Map, json};

use super::{apply_assignees_and_labels, copy_defined, query_from, repo_path, repo_path_with, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::record::{OutputRecord, records_from_response};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::Issue;

const SORT: &[(&str, &str)] = &[
    ("Created", "created"),
    ("Due Date", "due_date"),
    ("Priority", "priority"),
    ("Updated", "updated"),
];

const STATE_FILTER: &[(&str, &str)] = &[("All", "all"), ("Closed", "closed"), ("Open", "open")];

fn issue_fields() -> Vec<Property> {
    vec![
        Property::string("assignees", "Assignees")
            .description("Comma-separated list of usernames"),
        Property::string("body", "Body"),
        Property::date_time("due_date", "Deadline"),
        Property::string("labels", "Labels").description("Comma-separated list of label IDs"),
        Property::number("milestone", "Milestone", 0),
    ]
}

fn fields() -> Vec<Property> {
    let scoped = [
        Operation::Create,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
        Operation::List,
    ];

    let mut update = issue_fields();
    update.push(Property::options(
        "state",
        "State",
        &[("Open", "open"), ("Closed", "closed")],
        "open",
    ));
    update.push(Property::string("title", "Title"));

    vec![
        Property::string("owner", "Owner").required().show(R, &scoped),
        Property::string("repo", "Repository Name")
            .required()
            .show(R, &scoped),
        Property::number("issueNumber", "Issue Number", 0)
            .required()
            .show(R, &[Operation::Get, Operation::Update, Operation::Delete]),
        Property::string("title", "Title")
            .required()
            .show(R, &[Operation::Create]),
        Property::collection("additionalFields", "Additional Fields", issue_fields())
            .show(R, &[Operation::Create]),
        Property::collection("updateFields", "Update Fields", update).show(R, &[Operation::Update]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::string("labels", "Labels"),
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
                Property::string("milestone", "Milestone"),
                Property::options("sort", "Sort", SORT, "created"),
                Property::options("state", "State", STATE_FILTER, "open"),
            ],
        )
        .show(R, &[Operation::List]),
        Property::string("query", "Query")
            .required()
            .show(R, &[Operation::Search]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::string("labels", "Labels"),
                Property::number("limit", "Limit", DEFAULT_PAGE_SIZE),
                Property::options(
                    "order",
                    "Order",
                    &[("Ascending", "asc"), ("Descending", "desc")],
                    "desc",
                ),
                Property::options("sort", "Sort", SORT, "created"),
                Property::options("state", "State", STATE_FILTER, "open"),
            ],
        )
        .show(R, &[Operation::Search]),
    ]
}

fn issue_path(params: &ItemParameters) -> crate::error::Result<String> {
    let number = params.get_id_string("issueNumber")?;
    repo_path_with(params, Endpoint::Issue, "index", &number)
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Issues)?;
        let title = ctx.params.get_str("title")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = Map::new();
        body.insert("title".to_string(), json!(title));
        copy_defined(&mut body, &additional, &["body", "due_date", "milestone"]);
        apply_assignees_and_labels(&mut body, &additional);

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = issue_path(ctx.params)?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = issue_path(ctx.params)?;
        let changes = ctx.params.collection("updateFields")?;

        let mut body = Map::new();
        copy_defined(
            &mut body,
            &changes,
            &["title", "body", "state", "due_date", "milestone"],
        );
        apply_assignees_and_labels(&mut body, &changes);

        let response = send(ctx.client, HttpMethod::Patch, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = issue_path(ctx.params)?;
        send(ctx.client, HttpMethod::Delete, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::success()])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = repo_path(ctx.params, Endpoint::Issues)?;
        let additional = ctx.params.collection("additionalFields")?;
        let query = query_from(
            &additional,
            &["state", "labels", "milestone", "sort", "limit"],
        );

        let response = ctx
            .client
            .request(HttpMethod::Get, &endpoint, &Map::new(), &query)
            .await?;
        Ok(records_from_response(response))
    })
}

fn search(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let q = ctx.params.get_str("query")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut query = query_from(
            &additional,
            &["state", "labels", "sort", "order", "limit"],
        );
        if !q.is_empty() {
            query.set("q", q);
        }

        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                Endpoint::IssuesSearch.template(),
                &Map::new(),
                &query,
            )
            .await?;
        Ok(records_from_response(response))
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Create, "Create an issue"),
                (Operation::Delete, "Delete an issue"),
                (Operation::Get, "Get an issue"),
                (Operation::List, "List issues"),
                (Operation::Search, "Search issues"),
                (Operation::Update, "Update an issue"),
            ],
            Operation::Get,
        ))
        .with_fields(fields())
        .with_handler(Operation::Create, create)
        .with_handler(Operation::Get, get)
        .with_handler(Operation::Update, update)
        .with_handler(Operation::Delete, delete)
        .with_handler(Operation::List, list)
        .with_handler(Operation::Search, search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::http::MockTransport;
    use crate::resources::test_support::{api, push_no_content, run, sent_json};

    #[tokio::test]
    async fn test_create_parses_assignees_and_labels() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            api("/repos/acme/widgets/issues"),
            json!({ "number": 7 }),
        );

        run(
            &bundle(),
            Operation::Create,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "title": "Crash on start",
                "additionalFields": {
                    "assignees": "alice, bob",
                    "labels": "1, x, 3",
                    "milestone": 0
                }
            }),
        )
        .await
        .expect("create");

        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({
                "title": "Crash on start",
                "milestone": 0,
                "assignees": ["alice", "bob"],
                "labels": [1, 3]
            })
        );
    }

    #[tokio::test]
    async fn test_get_accepts_numeric_string() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/issues/42"),
            json!({ "number": 42 }),
        );

        let out = run(
            &bundle(),
            Operation::Get,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "issueNumber": "42" }),
        )
        .await
        .expect("get");
        assert_eq!(out, vec![json!({ "number": 42 })]);
    }

    #[tokio::test]
    async fn test_update_requires_issue_number() {
        let transport = MockTransport::new();
        let err = run(
            &bundle(),
            Operation::Update,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "updateFields": { "state": "closed" } }),
        )
        .await
        .expect_err("no issue number");
        assert!(matches!(err, ForgeError::Parameter { ref name, .. } if name == "issueNumber"));
    }

    #[tokio::test]
    async fn test_update_sends_state() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Patch,
            api("/repos/acme/widgets/issues/3"),
            json!({ "state": "closed" }),
        );

        run(
            &bundle(),
            Operation::Update,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "issueNumber": 3,
                "updateFields": { "state": "closed", "title": "" }
            }),
        )
        .await
        .expect("update");
        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({ "state": "closed" })
        );
    }

    #[tokio::test]
    async fn test_delete_emits_success() {
        let transport = MockTransport::new();
        push_no_content(&transport, HttpMethod::Delete, "/repos/acme/widgets/issues/3");

        let out = run(
            &bundle(),
            Operation::Delete,
            &transport,
            json!({ "owner": "acme", "repo": "widgets", "issueNumber": 3 }),
        )
        .await
        .expect("delete");
        assert_eq!(out, vec![json!({ "success": true })]);
    }

    #[tokio::test]
    async fn test_list_filters_and_splits_records() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/issues?limit=10&state=closed"),
            json!([{ "number": 1 }, { "number": 2 }]),
        );

        let out = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "additionalFields": { "state": "closed", "limit": 10, "labels": "" }
            }),
        )
        .await
        .expect("list");
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn test_search_uses_global_endpoint() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/issues/search?q=panic"),
            json!([{ "number": 9 }]),
        );

        let out = run(
            &bundle(),
            Operation::Search,
            &transport,
            json!({ "query": "panic" }),
        )
        .await
        .expect("search");
        assert_eq!(out, vec![json!({ "number": 9 })]);
    }
}

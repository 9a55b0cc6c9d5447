//! Repository file contents.
//!
//! File paths are hierarchical, so they are percent-encoded segment by
//! segment instead of validated as a single safe segment. Content is sent
//! base64-encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};

use super::{copy_defined, owner_repo_fields, query_from, repo_path, send};
use crate::endpoint::{Endpoint, encode_raw_path};
use crate::error::Result;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::params::ItemParameters;
use crate::query::set_if_defined;
use crate::record::{OutputRecord, records_from_response};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::File;

const OPERATIONS: [Operation; 5] = [
    Operation::Create,
    Operation::Get,
    Operation::Update,
    Operation::Delete,
    Operation::List,
];

const WRITES: [Operation; 3] = [Operation::Create, Operation::Update, Operation::Delete];

fn branch_fields() -> Vec<Property> {
    vec![
        Property::string("branch", "Branch")
            .description("Branch to commit to; defaults to the repository's default branch"),
        Property::string("newBranch", "New Branch")
            .description("Create this branch from `branch` and commit to it"),
    ]
}

fn fields() -> Vec<Property> {
    let mut create = branch_fields();
    create.insert(0, Property::string("authorEmail", "Author Email"));
    create.insert(1, Property::string("authorName", "Author Name"));

    let mut fields = Vec::from(owner_repo_fields(R, &OPERATIONS));
    fields.extend([
        Property::string("filePath", "File Path")
            .required()
            .placeholder("e.g. docs/README.md")
            .show(R, &[Operation::Create, Operation::Get, Operation::Update, Operation::Delete]),
        Property::string("content", "Content")
            .required()
            .description("Plain text; encoded before upload")
            .show(R, &[Operation::Create, Operation::Update]),
        Property::string("sha", "SHA")
            .required()
            .description("Blob SHA of the file being replaced or removed")
            .show(R, &[Operation::Update, Operation::Delete]),
        Property::string("commitMessage", "Commit Message")
            .required()
            .show(R, &WRITES),
        Property::collection("additionalFields", "Additional Fields", create)
            .show(R, &[Operation::Create]),
        Property::collection("additionalFields", "Additional Fields", branch_fields())
            .show(R, &[Operation::Update, Operation::Delete]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![Property::string("ref", "Ref").description("Branch, tag or commit to read from")],
        )
        .show(R, &[Operation::Get]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![
                Property::string("directoryPath", "Directory Path"),
                Property::string("ref", "Ref"),
            ],
        )
        .show(R, &[Operation::List]),
    ]);
    fields
}

fn file_path(params: &ItemParameters) -> Result<String> {
    let owner = params.get_str("owner")?;
    let repo = params.get_str("repo")?;
    let path = params.get_str("filePath")?;
    Endpoint::FileContents.resolve_raw(
        &[("owner", owner), ("repo", repo), ("filepath", path)],
        &["filepath"],
    )
}

/// `message`, plus `content` when given, plus the branch selectors.
fn commit_body(
    params: &ItemParameters,
    content: Option<&str>,
    additional: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    if let Some(content) = content {
        body.insert("content".to_string(), json!(STANDARD.encode(content)));
    }
    body.insert(
        "message".to_string(),
        json!(params.get_str("commitMessage")?),
    );
    copy_defined(&mut body, additional, &["branch"]);
    set_if_defined(&mut body, "new_branch", additional.get("newBranch"));
    Ok(body)
}

fn is_set(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::String(s)) if !s.is_empty())
}

fn create(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = file_path(ctx.params)?;
        let additional = ctx.params.collection("additionalFields")?;
        let content = ctx.params.get_str("content")?;

        let mut body = commit_body(ctx.params, Some(content), &additional)?;
        if is_set(&additional, "authorName") || is_set(&additional, "authorEmail") {
            let mut author = Map::new();
            set_if_defined(&mut author, "name", additional.get("authorName"));
            set_if_defined(&mut author, "email", additional.get("authorEmail"));
            body.insert("author".to_string(), Value::Object(author));
        }

        let response = send(ctx.client, HttpMethod::Post, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = file_path(ctx.params)?;
        let additional = ctx.params.collection("additionalFields")?;
        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                &endpoint,
                &Map::new(),
                &query_from(&additional, &["ref"]),
            )
            .await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn update(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = file_path(ctx.params)?;
        let additional = ctx.params.collection("additionalFields")?;
        let content = ctx.params.get_str("content")?;

        let mut body = commit_body(ctx.params, Some(content), &additional)?;
        body.insert("sha".to_string(), json!(ctx.params.get_str("sha")?));

        let response = send(ctx.client, HttpMethod::Put, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

/// Unlike other deletes, the commit record the server returns is passed on.
fn delete(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let endpoint = file_path(ctx.params)?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut body = commit_body(ctx.params, None, &additional)?;
        body.insert("sha".to_string(), json!(ctx.params.get_str("sha")?));

        let response = send(ctx.client, HttpMethod::Delete, &endpoint, &body).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn list(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let additional = ctx.params.collection("additionalFields")?;
        let base = repo_path(ctx.params, Endpoint::RepoContents)?;
        let endpoint = match additional.get("directoryPath") {
            Some(Value::String(dir)) if !dir.is_empty() => {
                format!("{base}/{}", encode_raw_path(dir, "directoryPath")?)
            }
            _ => base,
        };

        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                &endpoint,
                &Map::new(),
                &query_from(&additional, &["ref"]),
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
                (Operation::Create, "Create a file"),
                (Operation::Delete, "Delete a file"),
                (Operation::Get, "Get a file"),
                (Operation::List, "List files"),
                (Operation::Update, "Update a file"),
            ],
            Operation::Get,
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
    use crate::resources::test_support::{api, run, sent_json};

    #[tokio::test]
    async fn test_create_encodes_content_and_author() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            api("/repos/acme/widgets/contents/docs/my%20notes.md"),
            json!({ "content": { "sha": "abc" } }),
        );

        run(
            &bundle(),
            Operation::Create,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "docs/my notes.md",
                "content": "hello",
                "commitMessage": "Add notes",
                "additionalFields": { "authorName": "Alice", "newBranch": "notes" }
            }),
        )
        .await
        .expect("create");

        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({
                "content": "aGVsbG8=",
                "message": "Add notes",
                "new_branch": "notes",
                "author": { "name": "Alice" }
            })
        );
    }

    #[tokio::test]
    async fn test_create_without_author_omits_it() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            api("/repos/acme/widgets/contents/a.txt"),
            json!({}),
        );

        run(
            &bundle(),
            Operation::Create,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "a.txt",
                "content": "",
                "commitMessage": "empty",
                "additionalFields": { "authorEmail": "" }
            }),
        )
        .await
        .expect("create");
        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({ "content": "", "message": "empty" })
        );
    }

    #[tokio::test]
    async fn test_update_puts_sha() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Put,
            api("/repos/acme/widgets/contents/src/lib.rs"),
            json!({ "commit": { "sha": "def" } }),
        );

        run(
            &bundle(),
            Operation::Update,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "src/lib.rs",
                "content": "world",
                "sha": "abc",
                "commitMessage": "Update",
                "additionalFields": { "branch": "main" }
            }),
        )
        .await
        .expect("update");
        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({ "content": "d29ybGQ=", "message": "Update", "branch": "main", "sha": "abc" })
        );
    }

    #[tokio::test]
    async fn test_delete_returns_server_response() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Delete,
            api("/repos/acme/widgets/contents/old.txt"),
            json!({ "commit": { "sha": "f00" } }),
        );

        let out = run(
            &bundle(),
            Operation::Delete,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "old.txt",
                "sha": "abc",
                "commitMessage": "Remove"
            }),
        )
        .await
        .expect("delete");

        assert_eq!(out, vec![json!({ "commit": { "sha": "f00" } })]);
        assert_eq!(
            sent_json(&transport.requests()[0]),
            json!({ "message": "Remove", "sha": "abc" })
        );
    }

    #[tokio::test]
    async fn test_get_passes_ref() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/contents/README.md?ref=v1"),
            json!({ "name": "README.md" }),
        );

        let out = run(
            &bundle(),
            Operation::Get,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "README.md",
                "additionalFields": { "ref": "v1" }
            }),
        )
        .await
        .expect("get");
        assert_eq!(out, vec![json!({ "name": "README.md" })]);
    }

    #[tokio::test]
    async fn test_list_root_and_directory() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/contents"),
            json!([{ "name": "src" }, { "name": "README.md" }]),
        );
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/contents/src/bin"),
            json!([{ "name": "main.rs" }]),
        );

        let root = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({ "owner": "acme", "repo": "widgets" }),
        )
        .await
        .expect("root");
        assert_eq!(root.len(), 2);

        let nested = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "additionalFields": { "directoryPath": "src/bin" }
            }),
        )
        .await
        .expect("nested");
        assert_eq!(nested, vec![json!({ "name": "main.rs" })]);
    }

    #[tokio::test]
    async fn test_list_of_a_file_path_yields_one_record() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/contents/README.md"),
            json!({ "name": "README.md", "type": "file" }),
        );

        let out = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "additionalFields": { "directoryPath": "README.md" }
            }),
        )
        .await
        .expect("list");
        assert_eq!(out.len(), 1);
    }
    #[tokio::test]
    async fn test_list_encodes_directory_with_spaces() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            api("/repos/acme/widgets/contents/my%20docs/sub%20folder"),
            json!([{ "name": "notes.md" }]),
        );

        let out = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "additionalFields": { "directoryPath": "my docs/sub folder" }
            }),
        )
        .await
        .expect("list");
        assert_eq!(out, vec![json!({ "name": "notes.md" })]);
    }

    #[tokio::test]
    async fn test_delete_refuses_path_climbing_out_of_contents() {
        let transport = MockTransport::new();

        let err = run(
            &bundle(),
            Operation::Delete,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "filePath": "../../../admin/users",
                "sha": "abc",
                "commitMessage": "Remove"
            }),
        )
        .await
        .expect_err("dot segments must be rejected");

        assert!(matches!(err, ForgeError::InvalidParameter { ref name } if name == "filepath"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_refuses_directory_climbing_out_of_contents() {
        let transport = MockTransport::new();

        let err = run(
            &bundle(),
            Operation::List,
            &transport,
            json!({
                "owner": "acme",
                "repo": "widgets",
                "additionalFields": { "directoryPath": "docs/../../../other" }
            }),
        )
        .await
        .expect_err("dot segments must be rejected");

        assert!(
            matches!(err, ForgeError::InvalidParameter { ref name } if name == "directoryPath")
        );
        assert!(transport.requests().is_empty());
    }
}

//! Batch execution over the registry.

use crate::client::ForgeClient;
use crate::error::{ForgeError, Result, short_error_message};
use crate::params::ItemParameters;
use crate::record::OutputRecord;
use crate::registry::{ItemContext, ResourceRegistry};

/// What to do when an item fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Abort the batch on the first failure.
    #[default]
    FailFast,
    /// Emit `{ "error": <message> }` for the failing item and keep going.
    CollectErrors,
}

impl ExecutionPolicy {
    pub fn from_continue_on_fail(continue_on_fail: bool) -> Self {
        if continue_on_fail {
            Self::CollectErrors
        } else {
            Self::FailFast
        }
    }
}

async fn run_item(
    registry: &ResourceRegistry,
    client: &ForgeClient,
    params: &ItemParameters,
    index: usize,
) -> Result<Vec<OutputRecord>> {
    let resource = params.get_str("resource")?;
    let operation = params.get_str("operation")?;

    let handler = registry
        .find_handler(resource, operation)
        .ok_or_else(|| ForgeError::unsupported(resource, operation))?;

    tracing::debug!(index, resource, operation, "dispatching item");
    handler(ItemContext {
        client,
        params,
        index,
    })
    .await
}

/// Run every item through its handler, sequentially and in input order.
///
/// Output records are concatenated in item order. Under
/// [`ExecutionPolicy::FailFast`] the first failure is returned as
/// [`ForgeError::ItemFailed`] carrying the item's index.
#[tracing::instrument(skip_all, fields(item_count = items.len(), policy = ?policy))]
pub async fn execute(
    registry: &ResourceRegistry,
    client: &ForgeClient,
    items: &[ItemParameters],
    policy: ExecutionPolicy,
) -> Result<Vec<OutputRecord>> {
    let mut records = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match run_item(registry, client, item, index).await {
            Ok(mut output) => records.append(&mut output),
            Err(err) => match policy {
                ExecutionPolicy::CollectErrors => {
                    let message = short_error_message(&err);
                    tracing::warn!(index, error = %message, "Item failed, continuing");
                    records.push(OutputRecord::error(message));
                }
                ExecutionPolicy::FailFast => {
                    return Err(ForgeError::ItemFailed {
                        index,
                        source: Box::new(err),
                    });
                }
            },
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credential;
    use crate::http::{HttpMethod, HttpResponse, MockTransport};
    use crate::resources::default_registry;
    use serde_json::json;
    use std::sync::Arc;

    const HOST: &str = "https://forge.test";

    fn client(transport: &MockTransport) -> ForgeClient {
        ForgeClient::new_with_transport(
            HOST,
            Credential::AccessToken("t".to_string()),
            Arc::new(transport.clone()),
        )
    }

    fn item(value: serde_json::Value) -> ItemParameters {
        ItemParameters::try_from(value).expect("object")
    }

    #[tokio::test]
    async fn test_unknown_pair_is_unsupported() {
        let registry = default_registry().expect("registry");
        let transport = MockTransport::new();

        let err = execute(
            &registry,
            &client(&transport),
            &[item(json!({ "resource": "branch", "operation": "merge" }))],
            ExecutionPolicy::FailFast,
        )
        .await
        .expect_err("branch.merge is not a thing");

        match err {
            ForgeError::ItemFailed { index, source } => {
                assert_eq!(index, 0);
                assert_eq!(source.to_string(), "Unsupported operation: branch.merge");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_collect_errors_keeps_order() {
        let registry = default_registry().expect("registry");
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            format!("{HOST}/api/v1/users/alice"),
            json!({ "login": "alice" }),
        );
        transport.push_response(
            HttpMethod::Get,
            format!("{HOST}/api/v1/users/ghost"),
            HttpResponse {
                status: 404,
                body: b"user does not exist".to_vec(),
            },
        );
        transport.push_json(
            HttpMethod::Get,
            format!("{HOST}/api/v1/user"),
            json!({ "login": "me" }),
        );

        let items = [
            item(json!({ "resource": "user", "operation": "getByUsername", "username": "alice" })),
            item(json!({ "resource": "user", "operation": "getByUsername", "username": "ghost" })),
            item(json!({ "resource": "user", "operation": "get" })),
        ];

        let records = execute(
            &registry,
            &client(&transport),
            &items,
            ExecutionPolicy::CollectErrors,
        )
        .await
        .expect("collect errors never fails the batch");

        let values: Vec<_> = records.into_iter().map(OutputRecord::into_value).collect();
        assert_eq!(
            values,
            vec![
                json!({ "login": "alice" }),
                json!({ "error": "HTTP 404: user does not exist" }),
                json!({ "login": "me" }),
            ]
        );
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let registry = default_registry().expect("registry");
        let transport = MockTransport::new();
        transport.push_json(HttpMethod::Get, format!("{HOST}/api/v1/user"), json!({ "id": 1 }));

        let items = [
            item(json!({ "resource": "user", "operation": "get" })),
            item(json!({ "resource": "user", "operation": "getByUsername" })),
            item(json!({ "resource": "user", "operation": "get" })),
        ];

        let err = execute(&registry, &client(&transport), &items, ExecutionPolicy::FailFast)
            .await
            .expect_err("second item lacks username");
        assert!(matches!(err, ForgeError::ItemFailed { index: 1, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_resource_is_a_parameter_error() {
        let registry = default_registry().expect("registry");
        let transport = MockTransport::new();

        let records = execute(
            &registry,
            &client(&transport),
            &[item(json!({ "operation": "get" }))],
            ExecutionPolicy::CollectErrors,
        )
        .await
        .expect("collected");
        assert_eq!(
            records[0].get("error"),
            Some(&json!("Parameter resource: is required"))
        );
    }

    #[tokio::test]
    async fn test_empty_batch_yields_no_records() {
        let registry = default_registry().expect("registry");
        let transport = MockTransport::new();
        let records = execute(&registry, &client(&transport), &[], ExecutionPolicy::FailFast)
            .await
            .expect("empty");
        assert!(records.is_empty());
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(
            ExecutionPolicy::from_continue_on_fail(true),
            ExecutionPolicy::CollectErrors
        );
        assert_eq!(ExecutionPolicy::default(), ExecutionPolicy::FailFast);
    }
}

use serde_json::{Map, Value};

use super::{query_from, send};
use crate::client::DEFAULT_PAGE_SIZE;
use crate::endpoint::Endpoint;
use crate::fields::{Property, operation_selector};
use crate::http::HttpMethod;
use crate::load_options::{get_users, search_users};
use crate::record::{OutputRecord, records_from_response, unwrap_data_envelope};
use crate::registry::{HandlerFuture, ItemContext, Operation, Resource, ResourceBundle};

const R: Resource = Resource::User;

fn fields() -> Vec<Property> {
    vec![
        Property::string("username", "Username")
            .required()
            .show(R, &[Operation::GetByUsername]),
        Property::string("query", "Query")
            .required()
            .show(R, &[Operation::Search]),
        Property::collection(
            "additionalFields",
            "Additional Fields",
            vec![Property::number("limit", "Limit", DEFAULT_PAGE_SIZE)],
        )
        .show(R, &[Operation::Search]),
    ]
}

/// The authenticated user.
fn get(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let response = ctx.client.verify_credentials().await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn get_by_username(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let username = ctx.params.get_str("username")?;
        let endpoint = Endpoint::UserByName.resolve(&[("owner", username)])?;
        let response = send(ctx.client, HttpMethod::Get, &endpoint, &Map::new()).await?;
        Ok(vec![OutputRecord::from_value(response)])
    })
}

fn search(ctx: ItemContext<'_>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let q = ctx.params.get_str("query")?;
        let additional = ctx.params.collection("additionalFields")?;

        let mut query = query_from(&additional, &["limit"]);
        if !q.is_empty() {
            query.set("q", Value::from(q));
        }

        let response = ctx
            .client
            .request(
                HttpMethod::Get,
                Endpoint::UsersSearch.template(),
                &Map::new(),
                &query,
            )
            .await?;
        Ok(records_from_response(unwrap_data_envelope(response)))
    })
}

pub fn bundle() -> ResourceBundle {
    ResourceBundle::new(R)
        .with_operations(operation_selector(
            R,
            &[
                (Operation::Get, "Get authenticated user"),
                (Operation::GetByUsername, "Get a user by username"),
                (Operation::Search, "Search users"),
            ],
            Operation::Get,
        ))
        .with_fields(fields())
        .with_handler(Operation::Get, get)
        .with_handler(Operation::GetByUsername, get_by_username)
        .with_handler(Operation::Search, search)
        .with_load_options("getUsers", get_users)
        .with_list_search("searchUsers", search_users)
}

use std::io::Read;
use std::path::Path;

use forgekit::{ExecutionPolicy, ForgeError, ItemParameters, default_registry, execute};
use serde_json::Value;

use crate::commands::shared::{ConnectionArgs, connect, print_json};
use crate::config::Config;

/// Parse a batch: either a JSON array of item objects or a single object.
pub(crate) fn parse_items(input: &str) -> Result<Vec<ItemParameters>, ForgeError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| ForgeError::parameter("items", format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => items.into_iter().map(ItemParameters::try_from).collect(),
        other => Ok(vec![ItemParameters::try_from(other)?]),
    }
}

fn read_input(file: &Path) -> std::io::Result<String> {
    if file == Path::new("-") {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        std::fs::read_to_string(file)
    }
}

pub(crate) async fn handle_run(
    file: &Path,
    continue_on_fail: bool,
    connection: &ConnectionArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = parse_items(&read_input(file)?)?;
    let policy =
        ExecutionPolicy::from_continue_on_fail(continue_on_fail || config.execution.continue_on_fail);

    let registry = default_registry()?;
    let client = connect(config, connection)?;

    tracing::info!(items = items.len(), ?policy, "Running batch");
    let records = execute(&registry, &client, &items, policy).await?;

    print_json(&records)
}

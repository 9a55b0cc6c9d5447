//! Option providers and credential checks.

use forgekit::{ItemParameters, ResourceRegistry, default_registry};

use crate::commands::shared::{ConnectionArgs, connect, print_json};
use crate::config::Config;

/// Parse a single `key=value` pair.
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn unknown_provider(kind: &str, name: &str, known: impl Iterator<Item = &'static str>) -> String {
    let known: Vec<&str> = known.collect();
    format!("Unknown {kind} provider '{name}'. Available: {}", known.join(", "))
}

pub(crate) async fn handle_options(
    name: &str,
    params: Vec<(String, String)>,
    connection: &ConnectionArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry()?;
    let provider = lookup_load_options(&registry, name)?;

    let params = params
        .into_iter()
        .fold(ItemParameters::new(), |acc, (key, value)| acc.with(key, value));
    let client = connect(config, connection)?;

    let options = provider(&client, &params).await?;
    print_json(&options)
}

pub(crate) async fn handle_search(
    name: &str,
    filter: Option<&str>,
    connection: &ConnectionArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry()?;
    let provider = registry
        .all_list_search()
        .get(name)
        .copied()
        .ok_or_else(|| unknown_provider("search", name, registry.all_list_search().keys().copied()))?;

    let client = connect(config, connection)?;
    let result = provider(&client, filter).await?;
    print_json(&result)
}

pub(crate) async fn handle_whoami(
    connection: &ConnectionArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(config, connection)?;
    let user = client.verify_credentials().await?;
    print_json(&user)
}

fn lookup_load_options(
    registry: &ResourceRegistry,
    name: &str,
) -> Result<forgekit::load_options::LoadOptionsFn, String> {
    registry
        .all_load_options()
        .get(name)
        .copied()
        .ok_or_else(|| unknown_provider("options", name, registry.all_load_options().keys().copied()))
}

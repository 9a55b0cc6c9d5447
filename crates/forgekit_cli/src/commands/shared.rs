use clap::ValueEnum;
use forgekit::{AuthMode, ForgeClient};
use serde::Serialize;

use crate::config::Config;

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Authentication mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum AuthArg {
    /// Personal access token
    Token,
    /// OAuth2 access token
    Oauth2,
}

impl From<AuthArg> for AuthMode {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Token => AuthMode::AccessToken,
            AuthArg::Oauth2 => AuthMode::OAuth2,
        }
    }
}

/// Connection flags shared by every command that talks to the forge.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct ConnectionArgs {
    /// Forge base URL (default from config or https://codeberg.org)
    #[arg(short = 'H', long)]
    pub(crate) host: Option<String>,

    /// Credential to use (default from config or token)
    #[arg(short, long, value_enum)]
    pub(crate) auth: Option<AuthArg>,
}

/// Build a client from config, with flags taking precedence.
pub(crate) fn connect(
    config: &Config,
    args: &ConnectionArgs,
) -> Result<ForgeClient, Box<dyn std::error::Error>> {
    let host = args.host.as_deref().unwrap_or(&config.forge.host);
    let mode = args.auth.map(AuthMode::from).unwrap_or(config.auth.mode);

    let credential = config.credential_store_for(host).select(mode)?;
    tracing::debug!(host, mode = %mode, "connecting");

    Ok(ForgeClient::new(host, credential)?.with_node_name(config.forge.node_name.clone()))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

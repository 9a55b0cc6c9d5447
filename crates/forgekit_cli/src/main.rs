//! Forgekit CLI - run resource operations against a Gitea or Forgejo forge.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::shared::{ConnectionArgs, OutputFormat};

#[derive(Parser)]
#[command(name = "forgekit")]
#[command(version)]
#[command(about = "Resource operations over the Gitea/Forgejo REST API")]
#[command(
    long_about = "Forgekit maps `resource.operation` pairs (issue.create, branch.list, \
file.update, ...) onto the Gitea/Forgejo REST API. Batches of items are read as JSON \
and the resulting records are printed as JSON."
)]
#[command(after_long_help = r#"EXAMPLES
    Run a batch of items from a file:
        $ forgekit run items.json

    Keep going past failing items:
        $ forgekit run items.json --continue-on-fail

    Read items from stdin against a self-hosted instance:
        $ echo '{"resource":"user","operation":"get"}' | forgekit run - --host https://git.example.com

    Show every resource, its operations and providers:
        $ forgekit describe

    List labels for a repository picker:
        $ forgekit options getLabels --param owner=forgejo --param repositoryName=forgejo

    Generate shell completions:
        $ forgekit completions bash > ~/.local/share/bash-completion/completions/forgekit

CONFIGURATION
    Forgekit reads configuration from:
      1. ~/.config/forgekit/config.toml (or $XDG_CONFIG_HOME/forgekit/config.toml)
      2. ./forgekit.toml
      3. Environment variables (FORGEKIT_* prefix, nested keys joined by "__")
      4. .env file in current directory

ENVIRONMENT VARIABLES
    FORGEKIT_FORGE__HOST                  Forge base URL (default: https://codeberg.org)
    FORGEKIT_FORGE__NODE_NAME             Prefix of transport error messages
    FORGEKIT_AUTH__MODE                   accessToken or oAuth2
    FORGEKIT_AUTH__TOKEN                  Personal access token
    FORGEKIT_AUTH__OAUTH2_TOKEN           OAuth2 access token
    FORGEKIT_EXECUTION__CONTINUE_ON_FAIL  Emit error records instead of aborting
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a batch of items and print the output records
    Run {
        /// JSON file holding an array of items (or one item); "-" reads stdin
        file: PathBuf,

        /// Emit an error record for a failing item and continue
        #[arg(long)]
        continue_on_fail: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Describe registered resources, operations and fields
    Describe {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Call a load-options provider (e.g. getLabels)
    Options {
        /// Provider name
        name: String,

        /// Current parameter value, as key=value (repeatable)
        #[arg(short, long = "param", value_parser = commands::providers::parse_key_val)]
        params: Vec<(String, String)>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Call a list-search provider (e.g. searchRepositories)
    Search {
        /// Provider name
        name: String,

        /// Optional filter text
        filter: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Verify credentials and show the authenticated user
    Whoami {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when stdout is not a terminal
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("forgekit=info,forgekit_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            continue_on_fail,
            connection,
        } => {
            commands::run::handle_run(&file, continue_on_fail, &connection, &config).await?;
        }
        Commands::Describe { output } => {
            commands::describe::handle_describe(output)?;
        }
        Commands::Options {
            name,
            params,
            connection,
        } => {
            commands::providers::handle_options(&name, params, &connection, &config).await?;
        }
        Commands::Search {
            name,
            filter,
            connection,
        } => {
            commands::providers::handle_search(&name, filter.as_deref(), &connection, &config)
                .await?;
        }
        Commands::Whoami { connection } => {
            commands::providers::handle_whoami(&connection, &config).await?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
    }

    Ok(())
}

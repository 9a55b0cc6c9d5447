//! Configuration file support for forgekit.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `FORGEKIT_`, nested keys joined
//!    with `__`, e.g. `FORGEKIT_AUTH__TOKEN`)
//! 3. Config file (./forgekit.toml, then ~/.config/forgekit/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [forge]
//! host = "https://codeberg.org"  # any Gitea/Forgejo instance
//! node_name = "forgekit"         # prefix of transport error messages
//!
//! [auth]
//! mode = "accessToken"           # or "oAuth2"
//! token = "..."                  # or use FORGEKIT_AUTH__TOKEN
//! oauth2_token = "..."           # or use FORGEKIT_AUTH__OAUTH2_TOKEN
//!
//! [execution]
//! continue_on_fail = false
//! ```

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config as ConfigBuilder, ConfigBuilder as Builder, Environment, File, FileFormat};
use directories::ProjectDirs;
use forgekit::client::DEFAULT_NODE_NAME;
use forgekit::{AuthMode, CODEBERG_HOST, CredentialStore, OAuth2Credential};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which forge to talk to.
    pub forge: ForgeConfig,
    /// Stored credentials.
    pub auth: AuthConfig,
    /// Batch execution defaults.
    pub execution: ExecutionConfig,
}

/// Forge connection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Base URL of the instance, without the `/api/v1` prefix.
    pub host: String,
    /// Name used as the prefix of transport error messages.
    pub node_name: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            host: CODEBERG_HOST.to_string(),
            node_name: DEFAULT_NODE_NAME.to_string(),
        }
    }
}

/// Credentials on file.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Which credential to attach unless `--auth` says otherwise.
    pub mode: AuthMode,
    /// Personal access token.
    pub token: Option<String>,
    /// OAuth2 access token obtained out of band.
    pub oauth2_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("token", &self.token.is_some())
            .field("oauth2_token", &self.oauth2_token.is_some())
            .finish()
    }
}

/// Batch execution defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Emit an error record and keep going when an item fails.
    pub continue_on_fail: bool,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/forgekit/config.toml)
    /// 3. Local config file (./forgekit.toml)
    /// 4. Environment variables with FORGEKIT_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("forgekit.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./forgekit.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        Self::from_builder(builder.add_source(env_source()))
    }

    /// Build and deserialize, falling back to defaults on any error.
    fn from_builder(builder: Builder<DefaultState>) -> Self {
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// The credentials on file for the configured host.
    pub fn credential_store(&self) -> CredentialStore {
        self.credential_store_for(&self.forge.host)
    }

    /// The credentials on file, with OAuth2 endpoints derived from `host`.
    pub fn credential_store_for(&self, host: &str) -> CredentialStore {
        let mut store = CredentialStore::new();
        if let Some(token) = &self.auth.token {
            store = store.with_access_token(token.clone());
        }
        if let Some(token) = &self.auth.oauth2_token {
            store = store.with_oauth2(OAuth2Credential::for_host(host, token.clone()));
        }
        store
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "forgekit").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// `FORGEKIT_FORGE__HOST` -> `forge.host`.
fn env_source() -> Environment {
    Environment::with_prefix("FORGEKIT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

//! Forgekit - resource/operation mapping over the Gitea and Forgejo REST API.
//!
//! Every supported action is a `resource.operation` pair (for example
//! `issue.create` or `branch.list`). Each resource contributes a
//! [`ResourceBundle`] holding its operation selector, input fields, handlers
//! and option providers; the bundles are collected in a [`ResourceRegistry`]
//! and a batch of items is run through [`execute`].
//!
//! # Example
//!
//! ```ignore
//! use forgekit::{
//!     CODEBERG_HOST, Credential, ExecutionPolicy, ForgeClient, ItemParameters, default_registry,
//!     execute,
//! };
//!
//! let registry = default_registry()?;
//! let client = ForgeClient::new(CODEBERG_HOST, Credential::AccessToken(token))?;
//!
//! let item = ItemParameters::new()
//!     .with("resource", "issue")
//!     .with("operation", "get")
//!     .with("owner", "forgejo")
//!     .with("repo", "forgejo")
//!     .with("issueNumber", 1);
//!
//! let records = execute(&registry, &client, &[item], ExecutionPolicy::FailFast).await?;
//! ```

pub mod client;
pub mod credentials;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod fields;
pub mod http;
pub mod load_options;
pub mod params;
pub mod query;
pub mod record;
pub mod registry;
pub mod resources;

pub use client::{API_PREFIX, DEFAULT_PAGE_SIZE, ForgeClient, MAX_PAGE_SIZE};
pub use credentials::{AuthMode, CODEBERG_HOST, Credential, CredentialStore, OAuth2Credential};
pub use dispatch::{ExecutionPolicy, execute};
pub use endpoint::{Endpoint, resolve_endpoint};
pub use error::{ForgeError, Result, TransportError, short_error_message};
pub use fields::{Property, PropertyType};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use load_options::{ListSearchResult, OptionEntry};
pub use params::ItemParameters;
pub use query::{Query, build_query};
pub use record::OutputRecord;
pub use registry::{Operation, Resource, ResourceBundle, ResourceRegistry};
pub use resources::default_registry;

//! Credential types and authentication-mode selection.
//!
//! Two credential kinds are supported, mirroring what a Gitea-based forge
//! accepts: a personal access token sent as `Authorization: token <t>`, and an
//! OAuth2 access token (obtained elsewhere through the authorization-code flow
//! against `/login/oauth/authorize` and `/login/oauth/access_token`) sent as a
//! bearer token.

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Default Codeberg host.
pub const CODEBERG_HOST: &str = "https://codeberg.org";

/// Path of the OAuth2 authorization endpoint, relative to the host.
pub const OAUTH_AUTHORIZE_PATH: &str = "/login/oauth/authorize";

/// Path of the OAuth2 token endpoint, relative to the host.
pub const OAUTH_TOKEN_PATH: &str = "/login/oauth/access_token";

/// Which stored credential a client should attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Personal access token.
    #[default]
    #[serde(rename = "accessToken", alias = "token")]
    AccessToken,
    /// OAuth2 access token.
    #[serde(rename = "oAuth2", alias = "oauth2")]
    OAuth2,
}

impl AuthMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::AccessToken => "accessToken",
            AuthMode::OAuth2 => "oAuth2",
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accessToken" | "token" => Ok(AuthMode::AccessToken),
            "oAuth2" | "oauth2" => Ok(AuthMode::OAuth2),
            other => Err(ForgeError::Config(format!(
                "unknown authentication mode '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth2 endpoints and the token already obtained from them.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Credential {
    pub access_token: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub scope: String,
}

impl OAuth2Credential {
    /// An OAuth2 credential for `host` with the standard endpoint paths.
    pub fn for_host(host: &str, access_token: impl Into<String>) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            access_token: access_token.into(),
            authorize_url: format!("{host}{OAUTH_AUTHORIZE_PATH}"),
            access_token_url: format!("{host}{OAUTH_TOKEN_PATH}"),
            scope: String::new(),
        }
    }
}

/// A single credential, ready to be attached to requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    AccessToken(String),
    OAuth2(OAuth2Credential),
}

impl Credential {
    /// The value of the `Authorization` header for this credential.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        match self {
            Credential::AccessToken(token) => format!("token {}", token),
            Credential::OAuth2(oauth) => format!("Bearer {}", oauth.access_token),
        }
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        match self {
            Credential::AccessToken(_) => AuthMode::AccessToken,
            Credential::OAuth2(_) => AuthMode::OAuth2,
        }
    }
}

// Debug impls never print tokens.
impl std::fmt::Debug for OAuth2Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Credential")
            .field("authorize_url", &self.authorize_url)
            .field("access_token_url", &self.access_token_url)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&self.mode()).finish()
    }
}

/// The credentials a host has on file; at most one of each kind.
#[derive(Clone, Default)]
pub struct CredentialStore {
    access_token: Option<String>,
    oauth2: Option<OAuth2Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_oauth2(mut self, credential: OAuth2Credential) -> Self {
        self.oauth2 = Some(credential);
        self
    }

    /// Pick the credential for `mode`.
    pub fn select(&self, mode: AuthMode) -> Result<Credential> {
        let credential = match mode {
            AuthMode::AccessToken => self
                .access_token
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| Credential::AccessToken(t.clone())),
            AuthMode::OAuth2 => self
                .oauth2
                .as_ref()
                .filter(|c| !c.access_token.is_empty())
                .map(|c| Credential::OAuth2(c.clone())),
        };
        credential.ok_or_else(|| ForgeError::MissingCredential(mode.to_string()))
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("access_token", &self.access_token.is_some())
            .field("oauth2", &self.oauth2)
            .finish()
    }
}

//! Error types for forge API operations.

use thiserror::Error;

/// Failures of a single HTTP exchange with the forge API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response was valid JSON but not the shape the caller needed.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

/// Errors produced while resolving, issuing or dispatching forge operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// An endpoint placeholder had no value.
    #[error("Missing endpoint parameter: {name}")]
    MissingParameter { name: String },

    /// A path value failed the safe-path check.
    #[error(
        "Invalid {name}: must contain only letters, numbers, hyphens, underscores, dots, or plus signs"
    )]
    InvalidParameter { name: String },

    /// The underlying HTTP call failed.
    #[error("{node}: {source}")]
    Transport {
        node: String,
        #[source]
        source: TransportError,
    },

    /// No handler is registered for the requested pair.
    #[error("Unsupported operation: {resource}.{operation}")]
    UnsupportedOperation { resource: String, operation: String },

    /// An item parameter was absent or had the wrong type.
    #[error("Parameter {name}: {reason}")]
    Parameter { name: String, reason: String },

    /// A batch item failed while running under the fail-fast policy.
    #[error("item {index}: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: Box<ForgeError>,
    },

    /// Two bundles were registered for the same resource.
    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    /// A handler or option provider name was registered twice.
    #[error("method '{0}' is already registered")]
    DuplicateMethod(String),

    /// The selected authentication mode has no stored credential.
    #[error("no credential configured for authentication mode '{0}'")]
    MissingCredential(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ForgeError {
    /// Create a parameter error.
    #[inline]
    pub fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-operation error.
    #[inline]
    pub fn unsupported(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// The HTTP status of a transport failure, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport {
                source: TransportError::Status { status, .. },
                ..
            } => Some(*status),
            Self::ItemFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Get a short error message suitable for an output record.
///
/// Item failures are unwrapped so the record carries the cause, not the index.
pub fn short_error_message(err: &ForgeError) -> String {
    match err {
        ForgeError::ItemFailed { source, .. } => short_error_message(source),
        ForgeError::Transport {
            source: TransportError::Status { status, message },
            ..
        } => {
            if message.chars().count() > 200 {
                let truncated: String = message.chars().take(197).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        other => other.to_string(),
    }
}

/// Result type for forge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

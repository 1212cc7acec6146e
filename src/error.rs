//! Error types for the Pokedex gateway

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gateway
///
/// Covers failures of the downstream Pokemon service as well as the
/// configuration, middleware and transport concerns of the gateway itself.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-success status from the downstream service
    #[error("downstream service unavailable: {reason}")]
    DownstreamUnavailable {
        /// HTTP status returned by the downstream, `None` when no response arrived
        status: Option<u16>,
        reason: String,
    },

    /// The downstream service has no entity for the requested id
    #[error("not found: {0}")]
    NotFound(String),

    /// The downstream service rejected the input as invalid
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Middleware errors
    #[error("Middleware error: {0}")]
    Middleware(String),

    /// Listener bind or serve failures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a downstream failure that never produced a response.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Error::DownstreamUnavailable {
            status: None,
            reason: reason.into(),
        }
    }

    /// Machine readable error code, used in GraphQL extensions and envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DownstreamUnavailable { .. } => "DOWNSTREAM_UNAVAILABLE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::MalformedInput(_) => "MALFORMED_INPUT",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Middleware(_) => "MIDDLEWARE_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP-style status describing the outcome, reported in `meta.status`.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::DownstreamUnavailable { status, .. } => status.unwrap_or(502),
            Error::NotFound(_) => 404,
            Error::MalformedInput(_) => 400,
            _ => 500,
        }
    }

    /// Convert error to GraphQL error format
    pub fn to_graphql_error(&self) -> GraphQLError {
        GraphQLError {
            message: self.to_string(),
            extensions: self.extensions(),
        }
    }

    fn extensions(&self) -> std::collections::HashMap<String, serde_json::Value> {
        let mut map = std::collections::HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("status".to_string(), serde_json::json!(self.status_code()));
        map
    }
}

impl ErrorExtensions for Error {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("code", self.code());
            ext.set("status", i32::from(self.status_code()));
        })
    }
}

/// GraphQL error response format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub extensions: std::collections::HashMap<String, serde_json::Value>,
}

impl From<Error> for GraphQLError {
    fn from(err: Error) -> Self {
        err.to_graphql_error()
    }
}

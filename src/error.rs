//! Error types for the HAL client.
//!
//! # Taxonomy
//! - Not found: a GET answered with 404 is never an error; operations return
//!   `None` or an empty collection instead.
//! - Missing required link: `NoSuchLink`, always surfaced to the caller.
//! - Proxy construction / configuration failures: raised when the proxy or the
//!   configuration is built, never deferred to first use.
//! - Transport / server failures: `Transport` and `Server`, carrying the status
//!   and the structured server error body when one was sent.
//! - Conflicts (409) are `Server` errors the repository client may recover from.

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors produced by the client, the proxies and the remote operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A non-optional linked association has no matching link in `_links`.
    #[error("Link '{link_name}' could not be found!")]
    NoSuchLink { link_name: String },

    /// A proxy could not be built for the given entity kind.
    #[error("couldn't create proxy instance of {kind}: {message}")]
    ClientProxy {
        kind: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid client or type-registry configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An entity URI was already set to a different value.
    #[error("URI already set to {current}, refusing to overwrite with {attempted}")]
    UriConflict { current: Url, attempted: Url },

    /// The server answered with a non-success status.
    #[error("Server error: {0}")]
    Server(ServerError),

    /// The request never produced an HTTP response.
    #[error("Transport error for {uri}: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server response did not follow the expected protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A link href or configured location is not a valid URI.
    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    /// A proxy method was invoked through an accessor that does not match its role.
    #[error("Method '{method}' of {kind} cannot be invoked as {expected}")]
    UnsupportedMethod {
        kind: String,
        method: String,
        expected: &'static str,
    },

    /// A natural-id lookup was requested but none is registered.
    #[error("Client<{kind}> has not registered a natural id")]
    NaturalIdNotRegistered { kind: String },

    /// Conflict recovery patched the remote resource but it still differs.
    #[error("Reconciliation failed for {uri}: {message}")]
    Reconciliation { uri: Url, message: String },

    /// Every retry attempt failed.
    #[error("retries exhausted after {attempts} attempts for {uri}")]
    RetriesExhausted {
        uri: String,
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a proxy construction error for the given entity kind.
    pub fn client_proxy(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientProxy {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a proxy construction error that keeps its underlying cause.
    pub fn client_proxy_caused_by(
        kind: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ClientProxy {
            kind: kind.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing-link error.
    pub fn no_such_link(link_name: impl Into<String>) -> Self {
        Self::NoSuchLink {
            link_name: link_name.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            source,
        }
    }

    /// Name of the missing relation, for `NoSuchLink` errors.
    pub fn link_name(&self) -> Option<&str> {
        match self {
            Self::NoSuchLink { link_name } => Some(link_name),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server(server) => Some(server.status),
            Self::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True when the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// True when the server answered 409.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }

    /// True when repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server(server) => matches!(
                server.status,
                StatusCode::REQUEST_TIMEOUT
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::INTERNAL_SERVER_ERROR
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            Self::Transport { .. } => self.is_connect() || self.is_timeout(),
            _ => false,
        }
    }

    /// True when the connection to the server could not be established.
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_connect(),
            Self::RetriesExhausted { source, .. } => source.is_connect(),
            _ => false,
        }
    }

    /// True when the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            Self::RetriesExhausted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Error category used in logs and metrics labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoSuchLink { .. } => "no_such_link",
            Self::ClientProxy { .. } => "proxy",
            Self::Configuration { .. } => "configuration",
            Self::UriConflict { .. } => "uri_conflict",
            Self::Server(_) => "server",
            Self::Transport { .. } => "transport",
            Self::Protocol(_) => "protocol",
            Self::Json(_) => "json",
            Self::InvalidUri { .. } => "invalid_uri",
            Self::UnsupportedMethod { .. } => "unsupported_method",
            Self::NaturalIdNotRegistered { .. } => "natural_id",
            Self::Reconciliation { .. } => "reconciliation",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            uri: err.url().map(Url::to_string).unwrap_or_default(),
            source: err,
        }
    }
}

/// Error body some servers attach to 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorBody {
    /// When the server raised the error.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Server-side message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Response status.
    pub status: StatusCode,
    /// Canonical reason phrase for the status.
    pub status_text: String,
    /// Timestamp from the error body, when present.
    pub timestamp: Option<String>,
    /// Message from the error body, or the raw body when it is not structured.
    pub message: String,
}

impl ServerError {
    /// Build from a status and the raw response body.
    ///
    /// A body of the form `{"timestamp": ..., "message": ...}` is decoded;
    /// anything else becomes the message verbatim.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        match serde_json::from_str::<ServerErrorBody>(body) {
            Ok(ServerErrorBody {
                timestamp,
                message: Some(message),
            }) => Self {
                status,
                status_text,
                timestamp,
                message,
            },
            Ok(ServerErrorBody { timestamp, .. }) => Self {
                status,
                status_text,
                timestamp,
                message: body.to_string(),
            },
            Err(_) => Self {
                status,
                status_text,
                timestamp: None,
                message: body.trim().to_string(),
            },
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.status_text)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

//! Error types for API client operations.
//!
//! Every failure surfaced by the signing helpers, the transports and the
//! facade is a [`BbbError`] tagged with an [`ErrorKind`], so callers can tell
//! an unreachable server apart from one that answered with a bad status or a
//! body that could not be parsed.

use std::fmt;
use thiserror::Error;

/// The category of an API client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required configuration (base URL, secret) is missing or invalid.
    Configuration,
    /// Connection-level failure: DNS, TLS handshake, timeout, refused connection.
    Transport,
    /// The server answered, but with a non-2xx HTTP status.
    Network,
    /// The response body could not be parsed in the expected format.
    Parsing,
    /// Caller bug, e.g. a malformed header string handed to a merge helper.
    InvalidArgument,
}

impl ErrorKind {
    /// Returns a stable snake_case name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::Transport => "transport_error",
            Self::Network => "network_error",
            Self::Parsing => "parsing_error",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while building, sending or decoding an API call.
#[derive(Debug, Error)]
pub struct BbbError {
    kind: ErrorKind,
    message: String,
    /// HTTP status code, only set for [`ErrorKind::Network`].
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BbbError {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates a connection-level transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Creates an HTTP-level error for a non-2xx response.
    pub fn network(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                ErrorKind::Network,
                format!("Bad response. HTTP code: {}", status),
            )
        }
    }

    /// Creates a parsing error.
    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parsing, message)
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code for network errors.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true when the server could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        self.kind == ErrorKind::Transport
    }
}

impl fmt::Display for BbbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// A specialized Result type for API client operations.
pub type BbbResult<T> = Result<T, BbbError>;

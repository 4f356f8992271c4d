//! Error types for AWX operations.
//!
//! This module provides the error taxonomy shared by the transport client,
//! the search resolver, the result unwrapper and the attribute marshaler.
//! Field conversion errors are collected into [`Diagnostics`](crate::Diagnostics);
//! every other kind aborts the operation that produced it.

use crate::diagnostics::Diagnostic;
use thiserror::Error;

/// Main error type for AWX operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Network level failure (DNS, TLS, connection reset, cancellation)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Request did not complete before its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} on {method} {endpoint}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Request method
        method: String,
        /// Request endpoint (path and query)
        endpoint: String,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A single attribute had the wrong shape on the wire
    #[error("Attribute `{attribute}` expected {expected}, found {found}")]
    FieldConversion {
        /// Attribute name
        attribute: String,
        /// Expected kind
        expected: String,
        /// Shape actually received
        found: String,
    },

    /// No lookup group was satisfied by the configuration
    #[error("No identifying attributes supplied: {0}")]
    Resolution(String),

    /// A search returned zero results
    #[error("No matching resource: {0}")]
    NotFound(String),

    /// A search expected to be unique returned several results
    #[error("Ambiguous match: received {count} entries, expected 1, please refine the lookup")]
    AmbiguousMatch {
        /// Number of results reported by the server
        count: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A lifecycle hook rejected the state
    #[error("Hook failed: {0}")]
    Hook(String),
}

/// Specialized result type for AWX operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpStatus { .. } => "HTTP_STATUS_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::FieldConversion { .. } => "FIELD_CONVERSION_ERROR",
            Self::Resolution(_) => "RESOLUTION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AmbiguousMatch { .. } => "AMBIGUOUS_MATCH",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::Hook(_) => "HOOK_ERROR",
        }
    }

    /// Returns true for failures that may succeed when retried by the caller.
    ///
    /// Only network level failures qualify. HTTP status errors are never
    /// considered transient here; the caller decides what a 5xx means.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Returns true if the server reported 404 or a search matched nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::HttpStatus { status: 404, .. })
    }

    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Converts the error into a single error diagnostic.
    ///
    /// The summary should name the operation and endpoint; the detail is the
    /// error message itself.
    #[must_use]
    pub fn into_diagnostic(self, summary: impl Into<String>) -> Diagnostic {
        let diagnostic = Diagnostic::error(summary, self.to_string());
        match self {
            Self::FieldConversion { attribute, .. } => diagnostic.with_attribute(attribute),
            _ => diagnostic,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidEndpoint(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}

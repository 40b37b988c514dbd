//! Error types for configuration loading and dereferencing

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Operator-facing configuration defects.
///
/// Any of these aborts loading before a single test case runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Name outside the closed parameter set
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Identifier parameter that does not parse as a URL
    #[error("Invalid URL for {param}: {value:?} ({source})")]
    InvalidUrl {
        param: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// Value of the wrong kind for the parameter
    #[error("Value for {param} must be {expected}, found {found}")]
    WrongKind {
        param: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// `user` not of the form `name@host`
    #[error("Invalid user account {0:?}; expected name@host")]
    InvalidUser(String),

    /// `server` that is not a usable base URL
    #[error("Invalid server {value:?}: {reason}")]
    InvalidServer { value: String, reason: String },

    /// Structural problem with the config document itself
    #[error("Invalid test_config: {0}")]
    Document(String),
}

impl ConfigError {
    /// Create a document structure error
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }
}

/// A non-success HTTP status returned while dereferencing an identifier.
///
/// This is an expected outcome for several checks, so it travels inside
/// [`crate::transport::Dereferenced`] rather than as an `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status} while dereferencing {iri}")]
pub struct DereferenceError {
    pub status: StatusCode,
    pub iri: String,
}

impl DereferenceError {
    pub fn new(status: StatusCode, iri: impl Into<String>) -> Self {
        Self {
            status,
            iri: iri.into(),
        }
    }
}

/// Faults below the protocol level: nothing useful came back.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid URL {iri:?}: {source}")]
    InvalidUrl {
        iri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request to {iri} failed: {source}")]
    Request {
        iri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {iri} timed out")]
    Timeout { iri: String },

    #[error("Malformed JSON body from {iri}: {source}")]
    Body {
        iri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Classify a reqwest failure for the given IRI
    pub fn request(iri: impl Into<String>, source: reqwest::Error) -> Self {
        let iri = iri.into();
        if source.is_timeout() {
            Self::Timeout { iri }
        } else {
            Self::Request { iri, source }
        }
    }

    /// Check if the error came from the response body rather than the network
    pub fn is_body_error(&self) -> bool {
        matches!(self, Self::Body { .. })
    }
}

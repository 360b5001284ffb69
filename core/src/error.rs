//! Error types for the Ohmyfin API client.
//!
//! # Design
//! Callers branch on *where* a call failed: before any I/O (`Configuration`,
//! `Validation`), in the service (`Api`), or on the wire (`Transport`).
//! `Api` keeps the service's message, the HTTP status and any field-level
//! details so form-style errors can be shown next to the offending input.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Field-level error details as returned by the service, e.g.
/// `{"uetr": ["bad format"]}`.
pub type FieldErrors = Map<String, Value>;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `OhmyfinClient`.
#[derive(Error, Debug)]
pub enum Error {
    /// The client could not be constructed (missing credential, bad timeout).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Required operation parameters are missing. Raised before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// The service answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Api {
        message: String,
        status: u16,
        errors: FieldErrors,
    },

    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx response body was not a JSON object.
    #[error("could not decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// The request payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// HTTP status attached to the error, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Field-level details from an API rejection; `None` for every other kind.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Error::Api { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Broad classification of network-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    /// DNS resolution, refused or reset connections, TLS handshake.
    Connect,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Connect => write!(f, "connection failed"),
            TransportErrorKind::Other => write!(f, "transport failure"),
        }
    }
}

/// A failure reported by a `Transport` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

//! Blocking client for the Ohmyfin API: SWIFT payment tracking, status
//! reporting, routing validation and settlement instructions.
//!
//! # Overview
//! Each operation validates its options locally, builds a JSON request,
//! performs one HTTP round-trip through a `Transport`, and returns the
//! service's JSON object unchanged or a structured `Error`.
//!
//! # Design
//! - `OhmyfinClient` holds only immutable configuration and a transport, so
//!   it can be shared across threads.
//! - Operations are split into `build_*` (produces an `HttpRequest`) and
//!   `parse_response` (consumes an `HttpResponse`), keeping the I/O boundary
//!   explicit; the executing methods compose the two around `Transport`.
//! - Response bodies are opaque `Payload` maps; the service owns their shape.

pub mod client;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, OhmyfinClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, USER_AGENT};
pub use error::{Error, FieldErrors, Result, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Amount, ChangeRequest, Payload, SsiRequest, TrackRequest, ValidateRequest};

//! Request builder, response parser and round-trip driver for the Ohmyfin API.
//!
//! # Design
//! `OhmyfinClient` holds an immutable `ClientConfig` and a `Transport`.
//! Every operation is available in two shapes:
//! - `build_*` validates the options and produces an `HttpRequest` without
//!   touching the network; `parse_response` interprets whatever came back.
//! - `track`, `change`, `validate` and `get_ssi` run the full
//!   build → transport → parse pipeline in one blocking call.
//!
//! There are no retries. Each call is exactly one round-trip, or none at all
//! when local validation fails.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, FieldErrors, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{to_payload, ChangeRequest, Payload, SsiRequest, TrackRequest, ValidateRequest};

pub const DEFAULT_BASE_URL: &str = "https://ohmyfin.ai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const TRACK_PATH: &str = "/api/track";
pub const CHANGE_PATH: &str = "/api/change";
pub const VALIDATE_PATH: &str = "/api/validate";
pub const SSI_PATH: &str = "/api/getssi";

/// Header carrying the API key.
pub const AUTH_HEADER: &str = "KEY";
pub const USER_AGENT: &str = concat!("ohmyfin-rust/", env!("CARGO_PKG_VERSION"));

const GENERIC_FAILURE: &str = "API request failed";

/// Connection settings, fixed for the lifetime of a client.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Configuration(
                "API key is required. Get your API key at https://ohmyfin.ai".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Configuration("timeout must be greater than zero".to_string()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// The API key never appears in Debug output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Blocking client for the Ohmyfin API.
///
/// ```no_run
/// use ohmyfin_core::{OhmyfinClient, TrackRequest};
///
/// let client = OhmyfinClient::new("your-api-key")?;
/// let result = client.track(
///     &TrackRequest::new(10000u32, "2024-01-15", "USD")
///         .with_uetr("97ed4827-7b6f-4491-a06f-b548d5a7512d"),
/// )?;
/// println!("{}", result["status"]);
/// # Ok::<(), ohmyfin_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OhmyfinClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl OhmyfinClient<UreqTransport> {
    /// Client against the public service with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::with_config(ClientConfig::new(api_key)?))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport)
    }
}

impl<T: Transport> OhmyfinClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a request for an arbitrary API path. An empty or missing
    /// payload produces a request without a body.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&Payload>,
    ) -> Result<HttpRequest> {
        let body = match payload.filter(|p| !p.is_empty()) {
            Some(p) => Some(serde_json::to_string(p).map_err(|e| Error::Serialization(e.to_string()))?),
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url),
            headers: vec![
                (AUTH_HEADER.to_string(), self.config.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body,
            timeout: self.config.timeout,
        })
    }

    pub fn build_track(&self, input: &TrackRequest) -> Result<HttpRequest> {
        input.validate()?;
        self.build_request(HttpMethod::Post, TRACK_PATH, Some(&to_payload(input)?))
    }

    pub fn build_change(&self, input: &ChangeRequest) -> Result<HttpRequest> {
        input.validate()?;
        self.build_request(HttpMethod::Post, CHANGE_PATH, Some(&to_payload(input)?))
    }

    pub fn build_validate(&self, input: &ValidateRequest) -> Result<HttpRequest> {
        input.validate()?;
        self.build_request(HttpMethod::Post, VALIDATE_PATH, Some(&to_payload(input)?))
    }

    pub fn build_get_ssi(&self, input: &SsiRequest) -> Result<HttpRequest> {
        input.validate()?;
        self.build_request(HttpMethod::Post, SSI_PATH, Some(&to_payload(input)?))
    }

    /// Turn a raw response into the decoded JSON object or an `Error::Api`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Payload> {
        if !response.is_success() {
            return Err(api_error(&response));
        }
        match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::Decode {
                status: response.status,
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
            Err(e) => Err(Error::Decode {
                status: response.status,
                message: e.to_string(),
            }),
        }
    }

    /// One round-trip against `path`.
    pub fn request(&self, method: HttpMethod, path: &str, payload: Option<&Payload>) -> Result<Payload> {
        let request = self.build_request(method, path, payload)?;
        self.send(&request)
    }

    /// Track a payment by UETR or reference.
    ///
    /// The response usually carries `status`, `lastupdate`, `details` (one
    /// entry per bank in the chain) and `limits`.
    pub fn track(&self, input: &TrackRequest) -> Result<Payload> {
        let request = self.build_track(input)?;
        self.send(&request)
    }

    /// Report a status change for a payment.
    pub fn change(&self, input: &ChangeRequest) -> Result<Payload> {
        let request = self.build_change(input)?;
        self.send(&request)
    }

    /// Validate routing data before sending a payment.
    pub fn validate(&self, input: &ValidateRequest) -> Result<Payload> {
        let request = self.build_validate(input)?;
        self.send(&request)
    }

    /// Fetch standard settlement instructions for a bank and currency.
    pub fn get_ssi(&self, swift: &str, currency: &str) -> Result<Payload> {
        let request = self.build_get_ssi(&SsiRequest::new(swift, currency))?;
        self.send(&request)
    }

    fn send(&self, request: &HttpRequest) -> Result<Payload> {
        debug!(
            method = %request.method,
            url = %request.url,
            has_body = request.body.is_some(),
            "sending request"
        );
        let response = self.transport.execute(request)?;
        debug!(status = response.status, url = %request.url, "received response");
        self.parse_response(response)
    }
}

/// Map a non-2xx response to `Error::Api`, preferring the service's own
/// message and field errors when the body is a JSON object.
fn api_error(response: &HttpResponse) -> Error {
    let status = response.status;
    match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(mut body)) => {
            let message = match body.remove("message") {
                Some(Value::String(s)) => s,
                None | Some(Value::Null) => GENERIC_FAILURE.to_string(),
                Some(other) => other.to_string(),
            };
            let errors = match body.remove("errors") {
                Some(Value::Object(errors)) => errors,
                _ => FieldErrors::new(),
            };
            Error::Api {
                message,
                status,
                errors,
            }
        }
        _ => Error::Api {
            message: format!("{GENERIC_FAILURE} with status {status}"),
            status,
            errors: FieldErrors::new(),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

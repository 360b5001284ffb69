//! Executes `HttpRequest` values.
//!
//! # Design
//! The client never talks to the network directly; it hands a fully built
//! `HttpRequest` to a `Transport`. `UreqTransport` is the default. Tests
//! substitute a fake that records requests and replays canned responses.
//!
//! A transport reports only failures to obtain a response. Any HTTP status,
//! 4xx and 5xx included, comes back as `Ok(HttpResponse)` so the client can
//! interpret it.

use std::io::ErrorKind;
use std::sync::Arc;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// An agent is configured per request so the request's own timeout applies
/// to the whole call, from connect through reading the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .build()
            .new_agent();

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(classify_connect)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Error pages are not always UTF-8; the status must survive either way.
        let bytes = response.body_mut().read_to_vec().map_err(classify_body)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Failures before a response status was received.
fn classify_connect(err: ureq::Error) -> TransportError {
    let kind = if is_timeout(&err) {
        TransportErrorKind::Timeout
    } else {
        match &err {
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportErrorKind::Connect,
            ureq::Error::Io(io)
                if matches!(
                    io.kind(),
                    ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
                ) =>
            {
                TransportErrorKind::Connect
            }
            _ => TransportErrorKind::Other,
        }
    };
    TransportError::new(kind, err.to_string())
}

/// Failures while reading the body of a response that already arrived.
fn classify_body(err: ureq::Error) -> TransportError {
    let kind = if is_timeout(&err) {
        TransportErrorKind::Timeout
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}

fn is_timeout(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(io) => io.kind() == ErrorKind::TimedOut,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    /// Serve exactly one canned raw HTTP response, then close.
    fn serve_once(response: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            stream.write_all(&response).unwrap();
        });
        port
    }

    /// Consume the request head and a `Content-Length` body.
    fn read_request(stream: &mut std::net::TcpStream) {
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut buf).unwrap();
            received.extend_from_slice(&buf[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            if n == 0 {
                return;
            }
        };
        let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while received.len() < head_end + content_length {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
    }

    fn post(port: u16) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("http://127.0.0.1:{port}/api/getssi"),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(r#"{"swift":"DEUTDEFF","currency":"EUR"}"#.to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn non_utf8_error_body_still_returns_the_response() {
        let mut raw = b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe, 0x00, 0x81]);
        let port = serve_once(raw);

        let response = UreqTransport.execute(&post(port)).unwrap();
        assert_eq!(response.status, 500);
        assert!(response.body.contains('\u{FFFD}'));
    }

    #[test]
    fn non_utf8_error_body_maps_to_api_error_with_status() {
        let mut raw = b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe, 0x00, 0x81]);
        let port = serve_once(raw);

        let config = crate::ClientConfig::new("test-key")
            .unwrap()
            .with_base_url(&format!("http://127.0.0.1:{port}"));
        let err = crate::OhmyfinClient::with_config(config)
            .get_ssi("DEUTDEFF", "EUR")
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        match err {
            crate::Error::Api { message, .. } => {
                assert_eq!(message, "API request failed with status 500")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeout_while_waiting_for_response_is_a_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            std::thread::sleep(Duration::from_secs(3));
        });

        let mut request = post(port);
        request.timeout = Duration::from_millis(300);
        let err = UreqTransport.execute(&request).unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
    }

    #[test]
    fn refused_connection_is_a_connect_error() {
        // Bind then drop to get a port with nothing listening on it.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: format!("http://127.0.0.1:{port}/api/track"),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some("{}".to_string()),
            timeout: Duration::from_secs(2),
        };
        let err = UreqTransport.execute(&request).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Connect);
    }
}

//! Verify build/parse against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector describes the operation input, the expected request, a
//! simulated response and the expected result or error. Vectors whose
//! expected error is `Validation` have no request: the build step must fail.
//! Bodies are compared as parsed JSON; `raw_body`, when present, additionally
//! pins the exact byte layout including key order.

use ohmyfin_core::{
    ChangeRequest, ClientConfig, Error, HttpMethod, HttpRequest, HttpResponse, OhmyfinClient,
    Result, SsiRequest, TrackRequest, ValidateRequest,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> OhmyfinClient {
    OhmyfinClient::with_config(ClientConfig::new("test-key").unwrap().with_base_url(BASE_URL))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn run_vectors<I, F>(raw: &str, build: F)
where
    I: DeserializeOwned,
    F: Fn(&OhmyfinClient, &I) -> Result<HttpRequest>,
{
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: I = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_error = case.get("expected_error");

        let built = build(&c, &input);
        if expected_error.map(|e| e["kind"] == "Validation").unwrap_or(false) {
            let err = built.unwrap_err();
            assert!(err.is_validation(), "{name}: expected Validation, got {err:?}");
            continue;
        }

        // Verify build
        let req = built.unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let body = req.body.as_deref().unwrap();
        let req_body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");
        if let Some(raw_body) = expected_req.get("raw_body") {
            assert_eq!(body, raw_body.as_str().unwrap(), "{name}: raw body");
        }

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response(response);

        match expected_error {
            Some(expected) => match result.unwrap_err() {
                Error::Api {
                    message,
                    status,
                    errors,
                } => {
                    assert_eq!(expected["kind"], "Api", "{name}: kind");
                    assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
                    assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
                    assert_eq!(Value::Object(errors), expected["errors"], "{name}: errors");
                }
                other => panic!("{name}: unexpected error {other:?}"),
            },
            None => {
                let payload = result.unwrap();
                assert_eq!(Value::Object(payload), case["expected_result"], "{name}: parsed result");
            }
        }
    }
}

#[test]
fn track_test_vectors() {
    run_vectors::<TrackRequest, _>(include_str!("../../test-vectors/track.json"), |c, input| {
        c.build_track(input)
    });
}

#[test]
fn change_test_vectors() {
    run_vectors::<ChangeRequest, _>(include_str!("../../test-vectors/change.json"), |c, input| {
        c.build_change(input)
    });
}

#[test]
fn validate_test_vectors() {
    run_vectors::<ValidateRequest, _>(include_str!("../../test-vectors/validate.json"), |c, input| {
        c.build_validate(input)
    });
}

#[test]
fn getssi_test_vectors() {
    run_vectors::<SsiRequest, _>(include_str!("../../test-vectors/getssi.json"), |c, input| {
        c.build_get_ssi(input)
    });
}

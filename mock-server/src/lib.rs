//! In-memory stand-in for the Ohmyfin API.
//!
//! Serves the four POST endpoints the client talks to, checks the `KEY`
//! header, and keeps reported payment statuses in a map so `change` followed
//! by `track` behaves like the real service.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";

/// One bank's report in a payment's chain of custody.
#[derive(Clone, Debug, Serialize)]
struct BankStatus {
    role: String,
    status: String,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    swift: Option<String>,
    #[serde(rename = "nextName", skip_serializing_if = "Option::is_none")]
    next_name: Option<String>,
    #[serde(rename = "nextSwift", skip_serializing_if = "Option::is_none")]
    next_swift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct TrackedPayment {
    status: String,
    lastupdate: String,
    details: Vec<BankStatus>,
}

/// Payments keyed by lower-cased UETR or by reference.
type Db = Arc<RwLock<HashMap<String, TrackedPayment>>>;

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    db: Db,
}

#[derive(Deserialize)]
struct TrackBody {
    uetr: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Deserialize)]
struct ChangeBody {
    date: Option<String>,
    status: Option<String>,
    role: Option<String>,
    uetr: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
    swift: Option<String>,
    #[serde(rename = "nextName")]
    next_name: Option<String>,
    #[serde(rename = "nextSwift")]
    next_swift: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[derive(Deserialize)]
struct ValidateBody {
    beneficiary_bic: Option<String>,
    currency: Option<String>,
    correspondent_bic: Option<String>,
    beneficiary_iban: Option<String>,
}

#[derive(Deserialize)]
struct SsiBody {
    swift: Option<String>,
    currency: Option<String>,
}

type Rejection = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, Rejection>;

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Db::default(),
    };
    Router::new()
        .route("/api/track", post(track))
        .route("/api/change", post(change))
        .route("/api/validate", post(validate))
        .route("/api/getssi", post(get_ssi))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn track(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<TrackBody>) -> ApiResult {
    authorize(&headers, &state)?;
    let key = payment_key(body.uetr.as_deref(), body.reference.as_deref())?;
    let db = state.db.read().await;
    let payment = db
        .get(&key)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Transaction not found"))?;
    Ok(Json(json!({
        "status": payment.status,
        "lastupdate": payment.lastupdate,
        "details": payment.details,
        "limits": limits(),
    })))
}

async fn change(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<ChangeBody>) -> ApiResult {
    authorize(&headers, &state)?;
    let mut missing = Map::new();
    for (field, value) in [("status", &body.status), ("role", &body.role), ("date", &body.date)] {
        if blank(value.as_deref()) {
            missing.insert(field.to_string(), json!([format!("The {field} field is required.")]));
        }
    }
    if !missing.is_empty() {
        return Err(invalid(missing));
    }
    let key = payment_key(body.uetr.as_deref(), body.reference.as_deref())?;
    let ChangeBody {
        date,
        status,
        role,
        swift,
        next_name,
        next_swift,
        message,
        details,
        ..
    } = body;
    let (date, status, role) = (date.unwrap_or_default(), status.unwrap_or_default(), role.unwrap_or_default());

    let mut db = state.db.write().await;
    let payment = db.entry(key.clone()).or_default();
    payment.status = status.clone();
    payment.lastupdate = date.clone();
    payment.details.push(BankStatus {
        role,
        status,
        date,
        swift,
        next_name,
        next_swift,
        message,
        details,
    });
    info!(payment = %key, status = %payment.status, hops = payment.details.len(), "status updated");
    Ok(Json(json!({"message": "Status updated"})))
}

async fn validate(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<ValidateBody>) -> ApiResult {
    authorize(&headers, &state)?;
    let (bic, currency) = required_pair("beneficiary_bic", body.beneficiary_bic, body.currency)?;

    let mut result = Map::new();
    result.insert("beneficiary_bic".to_string(), verdict(is_bic(&bic)));
    if let Some(iban) = body.beneficiary_iban.filter(|s| !s.is_empty()) {
        result.insert("beneficiary_iban".to_string(), verdict(is_iban(&iban)));
    }
    if let Some(corr) = body.correspondent_bic.filter(|s| !s.is_empty()) {
        result.insert("correspondent_bic".to_string(), verdict(is_bic(&corr)));
    }
    result.insert("avg_business_days".to_string(), json!(2));
    result.insert("available_correspondents".to_string(), correspondents(&currency));
    Ok(Json(Value::Object(result)))
}

async fn get_ssi(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<SsiBody>) -> ApiResult {
    authorize(&headers, &state)?;
    let (swift, currency) = required_pair("swift", body.swift, body.currency)?;
    if !is_bic(&swift) {
        let mut errors = Map::new();
        errors.insert("swift".to_string(), json!(["bad format"]));
        return Err(rejection(StatusCode::UNPROCESSABLE_ENTITY, "invalid swift", errors));
    }
    Ok(Json(json!({
        "correspondents": correspondents(&currency),
        "currencies": ["USD", "EUR", "GBP"],
        "limits": limits(),
    })))
}

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), Rejection> {
    match headers.get("key").and_then(|v| v.to_str().ok()) {
        Some(key) if key == &*state.api_key => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "Unauthenticated.")),
    }
}

/// UETRs must be UUIDs; references are taken verbatim.
fn payment_key(uetr: Option<&str>, reference: Option<&str>) -> Result<String, Rejection> {
    if let Some(uetr) = uetr.filter(|s| !s.is_empty()) {
        return match Uuid::parse_str(uetr) {
            Ok(id) => Ok(id.to_string()),
            Err(_) => {
                let mut errors = Map::new();
                errors.insert("uetr".to_string(), json!(["bad format"]));
                Err(rejection(StatusCode::UNPROCESSABLE_ENTITY, "invalid uetr", errors))
            }
        };
    }
    if let Some(reference) = reference.filter(|s| !s.is_empty()) {
        return Ok(reference.to_string());
    }
    let mut errors = Map::new();
    errors.insert(
        "uetr".to_string(),
        json!(["The uetr field is required when ref is not present."]),
    );
    Err(invalid(errors))
}

fn required_pair(
    first_name: &str,
    first: Option<String>,
    currency: Option<String>,
) -> Result<(String, String), Rejection> {
    match (first.filter(|s| !s.is_empty()), currency.filter(|s| !s.is_empty())) {
        (Some(a), Some(b)) => Ok((a, b.to_uppercase())),
        (a, b) => {
            let mut errors = Map::new();
            if a.is_none() {
                errors.insert(first_name.to_string(), json!([format!("The {first_name} field is required.")]));
            }
            if b.is_none() {
                errors.insert("currency".to_string(), json!(["The currency field is required."]));
            }
            Err(invalid(errors))
        }
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

fn is_bic(code: &str) -> bool {
    matches!(code.len(), 8 | 11) && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_iban(iban: &str) -> bool {
    let compact: String = iban.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = compact.as_bytes();
    (15..=34).contains(&bytes.len())
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..4].iter().all(u8::is_ascii_digit)
        && bytes[4..].iter().all(u8::is_ascii_alphanumeric)
}

fn verdict(ok: bool) -> Value {
    json!(if ok { "valid" } else { "invalid" })
}

fn correspondents(currency: &str) -> Value {
    match currency {
        "USD" => json!([
            {"bank": "JPMorgan Chase Bank", "swift": "CHASUS33"},
            {"bank": "Citibank", "swift": "CITIUS33"},
        ]),
        "EUR" => json!([{"bank": "Deutsche Bank", "swift": "DEUTDEFF"}]),
        "GBP" => json!([{"bank": "Barclays Bank", "swift": "BARCGB22"}]),
        _ => json!([]),
    }
}

fn limits() -> Value {
    json!({"limit": 100, "left": 99})
}

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(json!({"message": message})))
}

fn rejection(status: StatusCode, message: &str, errors: Map<String, Value>) -> Rejection {
    (status, Json(json!({"message": message, "errors": errors})))
}

fn invalid(errors: Map<String, Value>) -> Rejection {
    rejection(StatusCode::UNPROCESSABLE_ENTITY, "The given data was invalid.", errors)
}

//! Request options for the Ohmyfin API.
//!
//! # Design
//! Each operation gets its own options struct with the required fields as
//! plain values and everything else as `Option<String>`. The serde attributes
//! *are* the wire contract: field order is the key order on the wire, renamed
//! fields (`ref`, `nextName`, `nextSwift`) carry the service's spelling, and
//! absent or empty optionals are skipped instead of being sent as `null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// An ordered JSON object, used for both outgoing bodies and decoded responses.
pub type Payload = Map<String, Value>;

/// A transaction amount as a JSON number.
///
/// Integers stay integers on the wire (`10000`, not `10000.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Number);

impl Amount {
    /// Returns `None` for NaN and infinities, which JSON cannot represent.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }
}

macro_rules! amount_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Amount {
            fn from(value: $t) -> Self {
                Self(Number::from(value))
            }
        })*
    };
}

amount_from_int!(u32, u64, i32, i64);

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn present(value: &Option<String>) -> bool {
    !is_blank(value)
}

/// Encode an options struct as an ordered JSON object.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Payload> {
    match serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Parameters for `POST /api/track`. One of `uetr` or `reference` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub amount: Amount,
    /// `YYYY-MM-DD`
    pub date: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uetr: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "is_blank")]
    pub reference: Option<String>,
}

impl TrackRequest {
    pub fn new(amount: impl Into<Amount>, date: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            date: date.into(),
            currency: currency.into(),
            uetr: None,
            reference: None,
        }
    }

    pub fn with_uetr(mut self, uetr: impl Into<String>) -> Self {
        self.uetr = Some(uetr.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_uetr_or_ref(&self.uetr, &self.reference)
    }
}

/// Parameters for `POST /api/change`, used by financial institutions to
/// report their leg of a payment.
///
/// `status` is one of `in process`, `success`, `rejected`, `on hold`;
/// `role` one of `originator`, `beneficiary`, `intermediary`,
/// `correspondent`, `other`. The service owns both vocabularies, so they are
/// passed through as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub amount: Amount,
    pub date: String,
    pub currency: String,
    pub status: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uetr: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "is_blank")]
    pub reference: Option<String>,
    /// BIC of the reporting institution.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub swift: Option<String>,
    #[serde(default, rename = "nextName", skip_serializing_if = "is_blank")]
    pub next_name: Option<String>,
    #[serde(default, rename = "nextSwift", skip_serializing_if = "is_blank")]
    pub next_swift: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub details: Option<String>,
}

impl ChangeRequest {
    pub fn new(
        amount: impl Into<Amount>,
        date: impl Into<String>,
        currency: impl Into<String>,
        status: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            date: date.into(),
            currency: currency.into(),
            status: status.into(),
            role: role.into(),
            uetr: None,
            reference: None,
            swift: None,
            next_name: None,
            next_swift: None,
            message: None,
            details: None,
        }
    }

    pub fn with_uetr(mut self, uetr: impl Into<String>) -> Self {
        self.uetr = Some(uetr.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_swift(mut self, swift: impl Into<String>) -> Self {
        self.swift = Some(swift.into());
        self
    }

    /// Name and BIC of the next bank in the chain.
    pub fn with_next_bank(mut self, name: impl Into<String>, swift: impl Into<String>) -> Self {
        self.next_name = Some(name.into());
        self.next_swift = Some(swift.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_uetr_or_ref(&self.uetr, &self.reference)?;
        if self.status.is_empty() || self.role.is_empty() {
            return Err(Error::Validation("status and role are required".to_string()));
        }
        Ok(())
    }
}

/// Parameters for `POST /api/validate`: pre-flight checks on routing data
/// before a payment is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub beneficiary_bic: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub correspondent_bic: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub correspondent_account: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub beneficiary_iban: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub beneficiary_owner: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub beneficiary_country: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub beneficiary_region: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub sender_bic: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub sender_correspondent_bic: Option<String>,
}

impl ValidateRequest {
    pub fn new(beneficiary_bic: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            beneficiary_bic: beneficiary_bic.into(),
            currency: currency.into(),
            ..Self::default()
        }
    }

    pub fn with_correspondent_bic(mut self, bic: impl Into<String>) -> Self {
        self.correspondent_bic = Some(bic.into());
        self
    }

    pub fn with_correspondent_account(mut self, account: impl Into<String>) -> Self {
        self.correspondent_account = Some(account.into());
        self
    }

    pub fn with_beneficiary_iban(mut self, iban: impl Into<String>) -> Self {
        self.beneficiary_iban = Some(iban.into());
        self
    }

    pub fn with_beneficiary_owner(mut self, owner: impl Into<String>) -> Self {
        self.beneficiary_owner = Some(owner.into());
        self
    }

    pub fn with_beneficiary_country(mut self, country: impl Into<String>) -> Self {
        self.beneficiary_country = Some(country.into());
        self
    }

    pub fn with_beneficiary_region(mut self, region: impl Into<String>) -> Self {
        self.beneficiary_region = Some(region.into());
        self
    }

    pub fn with_sender_bic(mut self, bic: impl Into<String>) -> Self {
        self.sender_bic = Some(bic.into());
        self
    }

    pub fn with_sender_correspondent_bic(mut self, bic: impl Into<String>) -> Self {
        self.sender_correspondent_bic = Some(bic.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.beneficiary_bic.is_empty() || self.currency.is_empty() {
            return Err(Error::Validation(
                "beneficiary_bic and currency are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for `POST /api/getssi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsiRequest {
    pub swift: String,
    pub currency: String,
}

impl SsiRequest {
    pub fn new(swift: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            swift: swift.into(),
            currency: currency.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.swift.is_empty() || self.currency.is_empty() {
            return Err(Error::Validation("swift and currency are required".to_string()));
        }
        Ok(())
    }
}

fn require_uetr_or_ref(uetr: &Option<String>, reference: &Option<String>) -> Result<()> {
    if present(uetr) || present(reference) {
        Ok(())
    } else {
        Err(Error::Validation("Either uetr or ref is required".to_string()))
    }
}

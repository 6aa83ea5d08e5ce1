pub mod admin;
pub mod budget;
pub mod health;
pub mod session;
pub mod transaction;
pub mod user;

use chrono::{DateTime, NaiveDate, Utc};
use rocket::serde::Serialize;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Amounts are stored as NUMERIC(14,2).
const MAX_AMOUNT_SCALE: u32 = 2;
const AMOUNT_UPPER_BOUND: i64 = 1_000_000_000_000;

/// Plain `{ "message": ... }` body used for confirmations and errors.
#[derive(Serialize, Debug, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub(crate) fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive_amount").with_message("Amount must be a positive number".into()));
    }
    if value.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(ValidationError::new("amount_precision").with_message("Amount cannot have more than 2 decimal places".into()));
    }
    if *value >= Decimal::from(AMOUNT_UPPER_BOUND) {
        return Err(ValidationError::new("amount_range").with_message("Amount is too large".into()));
    }
    Ok(())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (UTC midnight).
pub(crate) fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| D::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp", raw)))
}

use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
    /// Economic date of the transaction, distinct from `created_at`.
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    #[validate(custom(function = "crate::models::validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339; defaults to the time of creation when omitted.
    #[serde(default, deserialize_with = "crate::models::deserialize_optional_date")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Default, Validate, JsonSchema)]
pub struct TransactionUpdateRequest {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schemars(with = "Option<f64>")]
    #[validate(custom(function = "crate::models::validate_positive_amount"))]
    pub amount: Option<Decimal>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "crate::models::deserialize_optional_date")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct TransactionResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub note: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            user: transaction.user_id,
            kind: transaction.kind,
            category: transaction.category.clone(),
            amount: transaction.amount,
            note: transaction.note.clone(),
            date: transaction.date,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

/// Raw `?type=&category=` query of the transaction listing.
#[derive(Debug, Default, rocket::FromForm, JsonSchema)]
pub struct TransactionQuery {
    #[field(name = "type")]
    #[schemars(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn transaction_request_uses_type_key() {
        let request: TransactionRequest = serde_json::from_str(r#"{"type": "expense", "category": "Food", "amount": 12.5}"#).unwrap();
        assert_eq!(request.kind, TransactionKind::Expense);
        assert_eq!(request.amount, dec!(12.5));
        assert!(request.date.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn transaction_request_rejects_unknown_kind() {
        let parsed = serde_json::from_str::<TransactionRequest>(r#"{"type": "transfer", "category": "Food", "amount": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn transaction_request_rejects_negative_amount() {
        let request: TransactionRequest = serde_json::from_str(r#"{"type": "income", "category": "Salary", "amount": -10}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn transaction_request_accepts_date_only() {
        let request: TransactionRequest =
            serde_json::from_str(r#"{"type": "expense", "category": "Food", "amount": 4.2, "date": "2024-03-01"}"#).unwrap();
        assert_eq!(request.date.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let update: TransactionUpdateRequest = serde_json::from_str(r#"{"date": "2024-03-31"}"#).unwrap();
        assert_eq!(update.date.unwrap().to_rfc3339(), "2024-03-31T00:00:00+00:00");
    }

    #[test]
    fn transaction_request_rejects_sub_cent_and_oversized_amounts() {
        let request: TransactionRequest = serde_json::from_str(r#"{"type": "expense", "category": "Food", "amount": 0.005}"#).unwrap();
        assert!(request.validate().is_err());

        let request: TransactionRequest = serde_json::from_str(r#"{"type": "income", "category": "Salary", "amount": 1e12}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn transaction_kind_as_str_matches_serde() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}

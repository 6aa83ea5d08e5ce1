use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

/// A monthly spending ceiling for one category, owned by a single user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    #[sqlx(rename = "limit_amount")]
    pub limit: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct BudgetRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    #[validate(custom(function = "crate::models::validate_positive_amount"))]
    pub budget: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Partial replacement: absent fields keep their stored value.
#[derive(Deserialize, Debug, Default, Validate, JsonSchema)]
pub struct BudgetUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schemars(with = "Option<f64>")]
    #[validate(custom(function = "crate::models::validate_positive_amount"))]
    pub budget: Option<Decimal>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct BudgetResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub budget: Decimal,
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Budget> for BudgetResponse {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id,
            user: budget.user_id,
            category: budget.category.clone(),
            budget: budget.limit,
            note: budget.note.clone(),
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

/// Exact-match filters for listing budgets.
#[derive(Debug, Default, Clone)]
pub struct BudgetFilter {
    pub category: Option<String>,
    pub limit: Option<Decimal>,
}

/// A budget combined with this month's spend. Computed per request, never stored.
#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct BudgetStatus {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub budget: Decimal,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub spent: Decimal,
    pub warning: bool,
}

impl BudgetStatus {
    pub fn new(budget: &Budget, spent: Decimal, warning: bool) -> Self {
        Self {
            id: budget.id,
            user: budget.user_id,
            category: budget.category.clone(),
            budget: budget.limit,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
            spent,
            warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn budget_request_rejects_non_positive_limit() {
        let request = BudgetRequest {
            category: "food".to_string(),
            budget: Decimal::ZERO,
            note: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn budget_request_rejects_empty_category() {
        let request = BudgetRequest {
            category: String::new(),
            budget: dec!(100),
            note: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn budget_update_request_allows_empty_body() {
        let request: BudgetUpdateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_ok());
        assert!(request.budget.is_none());
    }

    #[test]
    fn budget_request_parses_numeric_limit() {
        let request: BudgetRequest = serde_json::from_str(r#"{"category": "Food", "budget": 150.5}"#).unwrap();
        assert_eq!(request.budget, dec!(150.5));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn budget_status_serializes_wire_shape() {
        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "Food".to_string(),
            limit: dec!(100),
            note: None,
            created_at: now,
            updated_at: now,
        };
        let status = BudgetStatus::new(&budget, dec!(95), true);
        let value = serde_json::to_value(&status).unwrap();

        assert_eq!(value["_id"], serde_json::json!(budget.id));
        assert_eq!(value["user"], serde_json::json!(budget.user_id));
        assert_eq!(value["category"], "Food");
        assert_eq!(value["budget"], 100.0);
        assert_eq!(value["spent"], 95.0);
        assert_eq!(value["warning"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}

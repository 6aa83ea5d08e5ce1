use crate::models::budget::BudgetResponse;
use crate::models::transaction::TransactionResponse;
use crate::models::user::UserResponse;
use rocket::serde::Serialize;
use rust_decimal::Decimal;
use schemars::JsonSchema;

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_transactions: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total_amount: Decimal,
    pub recent_users: Vec<UserResponse>,
    pub system_health: &'static str,
}

/// Look-back window of the system analytics, counted in whole months.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum TimeRange {
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
}

impl TimeRange {
    /// Unknown or missing values fall back to six months.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("3months") => TimeRange::ThreeMonths,
            Some("1year") => TimeRange::OneYear,
            _ => TimeRange::SixMonths,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            TimeRange::ThreeMonths => 3,
            TimeRange::SixMonths => 6,
            TimeRange::OneYear => 12,
        }
    }
}

/// Query of the analytics endpoint. The web client sends `timeRange`.
#[derive(Debug, Default, rocket::FromForm, JsonSchema)]
pub struct AnalyticsQuery {
    #[field(name = "timeRange")]
    #[field(name = "time_range")]
    #[schemars(rename = "timeRange")]
    pub time_range: Option<String>,
}

impl AnalyticsQuery {
    pub fn range(&self) -> TimeRange {
        TimeRange::from_query(self.time_range.as_deref())
    }
}

/// Collection dumped by the admin export.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExportKind {
    Users,
    Transactions,
    Budgets,
}

impl ExportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "users" => Some(ExportKind::Users),
            "transactions" => Some(ExportKind::Transactions),
            "budgets" => Some(ExportKind::Budgets),
            _ => None,
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ExportKind::Users => "users_export.json",
            ExportKind::Transactions => "transactions_export.json",
            ExportKind::Budgets => "budgets_export.json",
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(untagged)]
pub enum ExportData {
    Users(Vec<UserResponse>),
    Transactions(Vec<TransactionResponse>),
    Budgets(Vec<BudgetResponse>),
}

impl ExportData {
    pub fn row_count(&self) -> usize {
        match self {
            ExportData::Users(rows) => rows.len(),
            ExportData::Transactions(rows) => rows.len(),
            ExportData::Budgets(rows) => rows.len(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema, sqlx::FromRow)]
pub struct MonthlyUsers {
    pub month: String,
    pub users: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MonthlyTransactionRow {
    pub month: String,
    pub transactions: i64,
    pub revenue: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct MonthlyTransactions {
    pub month: String,
    pub transactions: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct MonthlyRevenue {
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub revenue: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema, sqlx::FromRow)]
pub struct CategoryCount {
    pub name: String,
    pub value: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: i64,
    pub total_transactions: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub avg_transaction_value: Decimal,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemAnalyticsResponse {
    pub user_growth: Vec<MonthlyUsers>,
    pub transaction_volume: Vec<MonthlyTransactions>,
    pub category_breakdown: Vec<CategoryCount>,
    pub revenue_data: Vec<MonthlyRevenue>,
    pub summary: AnalyticsSummary,
}

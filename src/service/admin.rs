use crate::database::admin::AdminRepository;
use crate::error::app_error::AppError;
use crate::models::admin::{
    AdminStatsResponse, AnalyticsSummary, ExportData, ExportKind, MonthlyRevenue, MonthlyTransactions, SystemAnalyticsResponse, TimeRange,
};
use crate::models::budget::BudgetResponse;
use crate::models::transaction::TransactionResponse;
use crate::models::user::UserResponse;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

/// A user is active when they created a transaction within this many days.
pub const ACTIVE_USER_WINDOW_DAYS: i64 = 30;
pub const RECENT_USERS_LIMIT: i64 = 5;
pub const TOP_CATEGORIES_LIMIT: i64 = 10;

/// Midnight UTC on the first day of the month `range` months before `now`'s month.
pub fn analytics_window_start(now: DateTime<Utc>, range: TimeRange) -> Result<DateTime<Utc>, AppError> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|first| first.checked_sub_months(Months::new(range.months())))
        .and_then(|start| start.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .ok_or_else(|| AppError::BadRequest("Analytics window is out of range".to_string()))
}

pub fn average_transaction_value(total: Decimal, count: i64) -> Decimal {
    if count > 0 {
        (total / Decimal::from(count)).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

pub struct AdminService<'a, R> {
    repository: &'a R,
}

impl<'a, R: AdminRepository> AdminService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<AdminStatsResponse, AppError> {
        let active_since = now - Duration::days(ACTIVE_USER_WINDOW_DAYS);

        let (total_users, active_users, (total_transactions, total_amount), recent_users) = tokio::try_join!(
            self.repository.count_users(),
            self.repository.count_active_users(active_since),
            self.repository.transaction_totals(None),
            self.repository.recent_users(RECENT_USERS_LIMIT),
        )?;

        Ok(AdminStatsResponse {
            total_users,
            active_users,
            total_transactions,
            total_amount,
            recent_users: recent_users.iter().map(UserResponse::from).collect(),
            system_health: "good",
        })
    }

    pub async fn analytics(&self, now: DateTime<Utc>, range: TimeRange) -> Result<SystemAnalyticsResponse, AppError> {
        let since = analytics_window_start(now, range)?;

        let (user_growth, monthly, category_breakdown, total_users, (total_transactions, total_revenue)) = tokio::try_join!(
            self.repository.user_growth(since),
            self.repository.monthly_transactions(since),
            self.repository.category_breakdown(since, TOP_CATEGORIES_LIMIT),
            self.repository.count_users(),
            self.repository.transaction_totals(Some(since)),
        )?;

        let transaction_volume = monthly
            .iter()
            .map(|row| MonthlyTransactions {
                month: row.month.clone(),
                transactions: row.transactions,
            })
            .collect();
        let revenue_data = monthly
            .into_iter()
            .map(|row| MonthlyRevenue {
                month: row.month,
                revenue: row.revenue,
            })
            .collect();

        Ok(SystemAnalyticsResponse {
            user_growth,
            transaction_volume,
            category_breakdown,
            revenue_data,
            summary: AnalyticsSummary {
                total_users,
                total_transactions,
                total_revenue,
                avg_transaction_value: average_transaction_value(total_revenue, total_transactions),
            },
        })
    }

    pub async fn users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn export(&self, kind: ExportKind) -> Result<ExportData, AppError> {
        let data = match kind {
            ExportKind::Users => ExportData::Users(self.users().await?),
            ExportKind::Transactions => ExportData::Transactions(self.repository.all_transactions().await?.iter().map(TransactionResponse::from).collect()),
            ExportKind::Budgets => ExportData::Budgets(self.repository.all_budgets().await?.iter().map(BudgetResponse::from).collect()),
        };
        info!(kind = ?kind, rows = data.row_count(), "exported data");
        Ok(data)
    }
}

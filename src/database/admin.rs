use crate::database::budget::BUDGET_SELECT_FIELDS;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::transaction::{TRANSACTION_SELECT_FIELDS, TransactionRow, rows_into_transactions};
use crate::database::user::{USER_SELECT_FIELDS, UserRow};
use crate::error::app_error::AppError;
use crate::models::admin::{CategoryCount, MonthlyTransactionRow, MonthlyUsers};
use crate::models::budget::Budget;
use crate::models::transaction::Transaction;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// System-wide reads behind the admin dashboard. Month labels are `YYYY-MM` in UTC,
/// sorted ascending.
#[async_trait::async_trait]
pub trait AdminRepository: Sync {
    async fn count_users(&self) -> Result<i64, AppError>;
    /// Distinct users who created a transaction at or after `since`.
    async fn count_active_users(&self, since: DateTime<Utc>) -> Result<i64, AppError>;
    /// Count and summed amount of transactions created at or after `since` (all time when `None`).
    async fn transaction_totals(&self, since: Option<DateTime<Utc>>) -> Result<(i64, Decimal), AppError>;
    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, AppError>;
    /// Every user, newest first.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn all_transactions(&self) -> Result<Vec<Transaction>, AppError>;
    async fn all_budgets(&self) -> Result<Vec<Budget>, AppError>;
    async fn user_growth(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyUsers>, AppError>;
    async fn monthly_transactions(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyTransactionRow>, AppError>;
    /// Most used categories by transaction count.
    async fn category_breakdown(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<CategoryCount>, AppError>;
}

#[async_trait::async_trait]
impl AdminRepository for PostgresRepository {
    async fn count_users(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn count_active_users(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let active: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM transaction WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(active)
    }

    async fn transaction_totals(&self, since: Option<DateTime<Utc>>) -> Result<(i64, Decimal), AppError> {
        #[derive(sqlx::FromRow)]
        struct TotalsRow {
            total: i64,
            amount: Decimal,
        }

        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT COUNT(*) AS total, COALESCE(SUM(amount), 0) AS amount
            FROM transaction
            WHERE $1::timestamptz IS NULL OR created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.total, row.amount))
    }

    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1
            "#,
            USER_SELECT_FIELDS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users ORDER BY created_at DESC", USER_SELECT_FIELDS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transaction ORDER BY occurred_at DESC, id DESC",
            TRANSACTION_SELECT_FIELDS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows_into_transactions(rows)
    }

    async fn all_budgets(&self) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(&format!("SELECT {} FROM budget ORDER BY created_at DESC, id DESC", BUDGET_SELECT_FIELDS))
            .fetch_all(&self.pool)
            .await?;

        Ok(budgets)
    }

    async fn user_growth(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyUsers>, AppError> {
        let rows = sqlx::query_as::<_, MonthlyUsers>(
            r#"
            SELECT to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                   COUNT(*) AS users
            FROM users
            WHERE created_at >= $1
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn monthly_transactions(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyTransactionRow>, AppError> {
        let rows = sqlx::query_as::<_, MonthlyTransactionRow>(
            r#"
            SELECT to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                   COUNT(*) AS transactions,
                   COALESCE(SUM(amount), 0) AS revenue
            FROM transaction
            WHERE created_at >= $1
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn category_breakdown(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<CategoryCount>, AppError> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category AS name, COUNT(*) AS value
            FROM transaction
            WHERE created_at >= $1
            GROUP BY category
            ORDER BY value DESC, name
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

use crate::database::budget::BUDGET_SELECT_FIELDS;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::transaction::{TRANSACTION_SELECT_FIELDS, TransactionRow, rows_into_transactions};
use crate::error::app_error::AppError;
use crate::models::budget::Budget;
use crate::models::transaction::{Transaction, TransactionKind};
use crate::service::month_window::DateRange;
use uuid::Uuid;

/// Reads the budget-warning computation needs from storage.
#[async_trait::async_trait]
pub trait BudgetWarningSource: Sync {
    /// All budgets of the user, oldest first.
    async fn list_budgets(&self, user_id: &Uuid) -> Result<Vec<Budget>, AppError>;
    /// Expense transactions of the user whose date lies in `range`, both ends inclusive.
    async fn list_expense_transactions(&self, user_id: &Uuid, range: &DateRange) -> Result<Vec<Transaction>, AppError>;
}

#[async_trait::async_trait]
impl BudgetWarningSource for PostgresRepository {
    async fn list_budgets(&self, user_id: &Uuid) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {}
            FROM budget
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
            BUDGET_SELECT_FIELDS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    async fn list_expense_transactions(&self, user_id: &Uuid, range: &DateRange) -> Result<Vec<Transaction>, AppError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {}
            FROM transaction
            WHERE user_id = $1
              AND kind = $2
              AND occurred_at >= $3
              AND occurred_at <= $4
            "#,
            TRANSACTION_SELECT_FIELDS
        ))
        .bind(user_id)
        .bind(TransactionKind::Expense.as_str())
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows_into_transactions(rows)
    }
}

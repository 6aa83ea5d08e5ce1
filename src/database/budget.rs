use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::budget::{Budget, BudgetFilter, BudgetRequest, BudgetUpdateRequest};
use crate::service::budget_warning::normalize_category;
use uuid::Uuid;

pub(crate) const BUDGET_SELECT_FIELDS: &str = "id, user_id, category, limit_amount, note, created_at, updated_at";

#[async_trait::async_trait]
pub trait BudgetRepository {
    async fn create_budget(&self, request: &BudgetRequest, user_id: &Uuid) -> Result<Budget, AppError>;
    async fn get_budget_by_id(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Budget>, AppError>;
    async fn list_budgets(&self, filter: &BudgetFilter, user_id: &Uuid) -> Result<Vec<Budget>, AppError>;
    async fn update_budget(&self, id: &Uuid, request: &BudgetUpdateRequest, user_id: &Uuid) -> Result<Option<Budget>, AppError>;
    /// Returns `false` when the user owns no budget with this id.
    async fn delete_budget(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, AppError>;
}

#[async_trait::async_trait]
impl BudgetRepository for PostgresRepository {
    async fn create_budget(&self, request: &BudgetRequest, user_id: &Uuid) -> Result<Budget, AppError> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            INSERT INTO budget (user_id, category, limit_amount, note)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BUDGET_SELECT_FIELDS
        ))
        .bind(user_id)
        .bind(normalize_category(&request.category))
        .bind(request.budget)
        .bind(&request.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }

    async fn get_budget_by_id(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Budget>, AppError> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {}
            FROM budget
            WHERE id = $1 AND user_id = $2
            "#,
            BUDGET_SELECT_FIELDS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    async fn list_budgets(&self, filter: &BudgetFilter, user_id: &Uuid) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {}
            FROM budget
            WHERE user_id = $1
              AND ($2::text IS NULL OR category = $2)
              AND ($3::numeric IS NULL OR limit_amount = $3)
            ORDER BY created_at DESC, id DESC
            "#,
            BUDGET_SELECT_FIELDS
        ))
        .bind(user_id)
        .bind(&filter.category)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    async fn update_budget(&self, id: &Uuid, request: &BudgetUpdateRequest, user_id: &Uuid) -> Result<Option<Budget>, AppError> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            UPDATE budget
            SET category = COALESCE($1, category),
                limit_amount = COALESCE($2, limit_amount),
                note = COALESCE($3, note),
                updated_at = now()
            WHERE id = $4 AND user_id = $5
            RETURNING {}
            "#,
            BUDGET_SELECT_FIELDS
        ))
        .bind(request.category.as_deref().map(normalize_category))
        .bind(request.budget)
        .bind(&request.note)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    async fn delete_budget(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM budget WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::transaction::{Transaction, TransactionFilter, TransactionKind, TransactionRequest, TransactionUpdateRequest};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

// Intermediate struct for sqlx query results with kind as text
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    category: String,
    amount: Decimal,
    note: Option<String>,
    occurred_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            kind: transaction_kind_from_db(&row.kind)?,
            category: row.category,
            amount: row.amount,
            note: row.note,
            date: row.occurred_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) const TRANSACTION_SELECT_FIELDS: &str = "id, user_id, kind, category, amount, note, occurred_at, created_at, updated_at";

pub fn transaction_kind_from_db<T: AsRef<str>>(value: T) -> Result<TransactionKind, AppError> {
    match value.as_ref() {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        other => Err(AppError::from(sqlx::Error::Decode(format!("Unknown transaction kind: {}", other).into()))),
    }
}

pub(crate) fn rows_into_transactions(rows: Vec<TransactionRow>) -> Result<Vec<Transaction>, AppError> {
    rows.into_iter().map(Transaction::try_from).collect()
}

#[async_trait::async_trait]
pub trait TransactionRepository {
    async fn create_transaction(&self, request: &TransactionRequest, occurred_at: DateTime<Utc>, user_id: &Uuid) -> Result<Transaction, AppError>;
    async fn get_transaction_by_id(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Transaction>, AppError>;
    async fn list_transactions(&self, filter: &TransactionFilter, user_id: &Uuid) -> Result<Vec<Transaction>, AppError>;
    async fn update_transaction(&self, id: &Uuid, request: &TransactionUpdateRequest, user_id: &Uuid) -> Result<Option<Transaction>, AppError>;
    async fn delete_transaction(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, AppError>;
}

#[async_trait::async_trait]
impl TransactionRepository for PostgresRepository {
    async fn create_transaction(&self, request: &TransactionRequest, occurred_at: DateTime<Utc>, user_id: &Uuid) -> Result<Transaction, AppError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transaction (user_id, kind, category, amount, note, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TRANSACTION_SELECT_FIELDS
        ))
        .bind(user_id)
        .bind(request.kind.as_str())
        .bind(&request.category)
        .bind(request.amount)
        .bind(&request.note)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await?;

        Transaction::try_from(row)
    }

    async fn get_transaction_by_id(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Transaction>, AppError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {}
            FROM transaction
            WHERE id = $1 AND user_id = $2
            "#,
            TRANSACTION_SELECT_FIELDS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn list_transactions(&self, filter: &TransactionFilter, user_id: &Uuid) -> Result<Vec<Transaction>, AppError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {}
            FROM transaction
            WHERE user_id = $1
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR category = $3)
            ORDER BY occurred_at DESC, id DESC
            "#,
            TRANSACTION_SELECT_FIELDS
        ))
        .bind(user_id)
        .bind(filter.kind.map(|kind| kind.as_str()))
        .bind(&filter.category)
        .fetch_all(&self.pool)
        .await?;

        rows_into_transactions(rows)
    }

    async fn update_transaction(&self, id: &Uuid, request: &TransactionUpdateRequest, user_id: &Uuid) -> Result<Option<Transaction>, AppError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            UPDATE transaction
            SET kind = COALESCE($1, kind),
                category = COALESCE($2, category),
                amount = COALESCE($3, amount),
                note = COALESCE($4, note),
                occurred_at = COALESCE($5, occurred_at),
                updated_at = now()
            WHERE id = $6 AND user_id = $7
            RETURNING {}
            "#,
            TRANSACTION_SELECT_FIELDS
        ))
        .bind(request.kind.map(|kind| kind.as_str()))
        .bind(&request.category)
        .bind(request.amount)
        .bind(&request.note)
        .bind(request.date)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn delete_transaction(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM transaction WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

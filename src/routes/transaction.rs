use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::transaction::TransactionRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::MessageResponse;
use crate::models::transaction::{TransactionFilter, TransactionKind, TransactionQuery, TransactionRequest, TransactionResponse, TransactionUpdateRequest};
use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

fn parse_transaction_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid transaction id", e))
}

fn parse_kind(raw: &str) -> Result<TransactionKind, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        _ => Err(AppError::BadRequest(format!("Invalid transaction type: {}", raw))),
    }
}

fn transaction_filter(query: TransactionQuery) -> Result<TransactionFilter, AppError> {
    Ok(TransactionFilter {
        kind: query.kind.as_deref().map(parse_kind).transpose()?,
        category: query.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
    })
}

/// Record an income or expense for the current user
#[openapi(tag = "Transactions")]
#[post("/", data = "<payload>")]
pub async fn create_transaction(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    payload: JsonBody<TransactionRequest>,
) -> Result<(Status, Json<TransactionResponse>), AppError> {
    payload.validate()?;

    let occurred_at = payload.date.unwrap_or_else(Utc::now);
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let transaction = repo.create_transaction(&payload, occurred_at, &current_user.id).await?;
    Ok((Status::Created, Json(TransactionResponse::from(&transaction))))
}

/// List the current user's transactions, most recent first
#[openapi(tag = "Transactions")]
#[get("/?<query..>")]
pub async fn list_all_transactions(pool: &State<PgPool>, current_user: CurrentUser, query: TransactionQuery) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let filter = transaction_filter(query)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let transactions = repo.list_transactions(&filter, &current_user.id).await?;
    Ok(Json(transactions.iter().map(TransactionResponse::from).collect()))
}

#[openapi(tag = "Transactions")]
#[get("/<id>")]
pub async fn get_transaction(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<TransactionResponse>, AppError> {
    let uuid = parse_transaction_id(id)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.get_transaction_by_id(&uuid, &current_user.id).await? {
        Some(transaction) => Ok(Json(TransactionResponse::from(&transaction))),
        None => Err(AppError::NotFound("Transaction not found".to_string())),
    }
}

#[openapi(tag = "Transactions")]
#[put("/<id>", data = "<payload>")]
pub async fn put_transaction(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<TransactionUpdateRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let uuid = parse_transaction_id(id)?;
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.update_transaction(&uuid, &payload, &current_user.id).await? {
        Some(transaction) => Ok(Json(TransactionResponse::from(&transaction))),
        None => Err(AppError::NotFound("Transaction not found".to_string())),
    }
}

#[openapi(tag = "Transactions")]
#[delete("/<id>")]
pub async fn delete_transaction(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let uuid = parse_transaction_id(id)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    if repo.delete_transaction(&uuid, &current_user.id).await? {
        Ok(Json(MessageResponse::new("Transaction deleted successfully")))
    } else {
        Err(AppError::NotFound("Transaction not found".to_string()))
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_transaction, list_all_transactions, get_transaction, put_transaction, delete_transaction]
}

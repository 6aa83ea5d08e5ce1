use crate::auth::CurrentUser;
use crate::database::budget::BudgetRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::MessageResponse;
use crate::models::budget::{BudgetFilter, BudgetRequest, BudgetResponse, BudgetStatus, BudgetUpdateRequest};
use crate::service::budget_warning::{BudgetWarningEngine, WarningPolicy};
use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

fn parse_budget_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid budget id", e))
}

fn budget_filter(category: Option<String>, budget: Option<String>) -> Result<BudgetFilter, AppError> {
    let limit = budget
        .map(|raw| Decimal::from_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid budget amount: {}", raw))))
        .transpose()?;

    Ok(BudgetFilter {
        category: category.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty()),
        limit,
    })
}

/// Create a budget for the current user
#[openapi(tag = "Budgets")]
#[post("/", data = "<payload>")]
pub async fn create_budget(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    payload: JsonBody<BudgetRequest>,
) -> Result<(Status, Json<BudgetResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let budget = repo.create_budget(&payload, &current_user.id).await?;
    Ok((Status::Created, Json(BudgetResponse::from(&budget))))
}

/// List the current user's budgets, newest first
#[openapi(tag = "Budgets")]
#[get("/?<category>&<budget>")]
pub async fn list_all_budgets(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    category: Option<String>,
    budget: Option<String>,
) -> Result<Json<Vec<BudgetResponse>>, AppError> {
    let filter = budget_filter(category, budget)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let budgets = repo.list_budgets(&filter, &current_user.id).await?;
    Ok(Json(budgets.iter().map(BudgetResponse::from).collect()))
}

/// Spending status of every budget for the current calendar month
#[openapi(tag = "Budgets")]
#[get("/warnings")]
pub async fn get_budget_warnings(pool: &State<PgPool>, policy: &State<WarningPolicy>, current_user: CurrentUser) -> Result<Json<Vec<BudgetStatus>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let statuses = BudgetWarningEngine::new(&repo, policy.inner()).compute_warnings(&current_user.id, Utc::now()).await?;
    Ok(Json(statuses))
}

#[openapi(tag = "Budgets")]
#[get("/<id>")]
pub async fn get_budget(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<BudgetResponse>, AppError> {
    let uuid = parse_budget_id(id)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.get_budget_by_id(&uuid, &current_user.id).await? {
        Some(budget) => Ok(Json(BudgetResponse::from(&budget))),
        None => Err(AppError::NotFound("Budget not found".to_string())),
    }
}

/// Update a budget; omitted fields are left unchanged
#[openapi(tag = "Budgets")]
#[put("/<id>", data = "<payload>")]
pub async fn put_budget(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<BudgetUpdateRequest>,
) -> Result<Json<BudgetResponse>, AppError> {
    let uuid = parse_budget_id(id)?;
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.update_budget(&uuid, &payload, &current_user.id).await? {
        Some(budget) => Ok(Json(BudgetResponse::from(&budget))),
        None => Err(AppError::NotFound("Budget not found".to_string())),
    }
}

#[openapi(tag = "Budgets")]
#[delete("/<id>")]
pub async fn delete_budget(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let uuid = parse_budget_id(id)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    if repo.delete_budget(&uuid, &current_user.id).await? {
        Ok(Json(MessageResponse::new("Budget deleted successfully")))
    } else {
        Err(AppError::NotFound("Budget not found".to_string()))
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_budget, list_all_budgets, get_budget_warnings, get_budget, put_budget, delete_budget]
}

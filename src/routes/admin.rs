use crate::auth::AdminUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::admin::{AdminStatsResponse, AnalyticsQuery, ExportData, ExportKind, SystemAnalyticsResponse};
use crate::models::user::UserResponse;
use crate::service::admin::AdminService;
use chrono::Utc;
use rocket::http::Header;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, State, get};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::openapi;
use rocket_okapi::response::OpenApiResponderInner;
use sqlx::PgPool;
use tracing::info;

/// System-wide usage counters for the admin dashboard
#[openapi(tag = "Admin")]
#[get("/stats")]
pub async fn get_admin_stats(pool: &State<PgPool>, _admin: AdminUser) -> Result<Json<AdminStatsResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let stats = AdminService::new(&repo).stats(Utc::now()).await?;
    Ok(Json(stats))
}

/// Monthly growth, volume and category analytics; `timeRange` is `3months`, `6months` or `1year`
#[openapi(tag = "Admin")]
#[get("/analytics?<query..>")]
pub async fn get_admin_analytics(pool: &State<PgPool>, _admin: AdminUser, query: AnalyticsQuery) -> Result<Json<SystemAnalyticsResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let analytics = AdminService::new(&repo).analytics(Utc::now(), query.range()).await?;
    Ok(Json(analytics))
}

/// Every account, newest first
#[openapi(tag = "Admin")]
#[get("/users")]
pub async fn list_users(pool: &State<PgPool>, admin: AdminUser) -> Result<Json<Vec<UserResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let users = AdminService::new(&repo).users().await?;
    info!(admin_id = %admin.0.id, users = users.len(), "listed users");
    Ok(Json(users))
}

/// JSON download of one collection, served as an attachment.
pub struct ExportFile {
    kind: ExportKind,
    data: ExportData,
}

impl<'r> Responder<'r, 'static> for ExportFile {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        let disposition = format!("attachment; filename={}", self.kind.filename());
        let mut response = Json(self.data).respond_to(req)?;
        response.set_header(Header::new("Content-Disposition", disposition));
        Ok(response)
    }
}

impl OpenApiResponderInner for ExportFile {
    fn responses(generator: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        Json::<ExportData>::responses(generator)
    }
}

/// Dump `users`, `transactions` or `budgets` as a JSON file
#[openapi(tag = "Admin")]
#[get("/export/<kind>")]
pub async fn export_data(pool: &State<PgPool>, admin: AdminUser, kind: &str) -> Result<ExportFile, AppError> {
    let kind = ExportKind::parse(kind).ok_or(AppError::InvalidExportType)?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let data = AdminService::new(&repo).export(kind).await?;
    info!(admin_id = %admin.0.id, kind = ?kind, "export served");
    Ok(ExportFile { kind, data })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_admin_stats, get_admin_analytics, list_users, export_data]
}

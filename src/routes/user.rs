use crate::auth::{CurrentUser, SESSION_COOKIE, parse_session_cookie_value, session_cookie_value};
use crate::config::SessionConfig;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::MessageResponse;
use crate::models::user::{LoginRequest, UserResponse};
use crate::service::auth::AuthService;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::serde::json::Json;
use rocket::time::Duration as CookieDuration;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// Log in with email and password; sets the session cookie
#[openapi(tag = "Users")]
#[post("/login", data = "<payload>")]
pub async fn post_user_login(
    pool: &State<PgPool>,
    session_config: &State<SessionConfig>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let outcome = AuthService::new(&repo, session_config.inner()).login(&payload).await?;

    let cookie = Cookie::build((SESSION_COOKIE, session_cookie_value(&outcome.session_id, &outcome.user.id)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(session_config.ttl_hours.max(1)))
        .build();
    cookies.add_private(cookie);

    Ok(Json(UserResponse::from(&outcome.user)))
}

/// End the current session
#[openapi(tag = "Users")]
#[post("/logout")]
pub async fn post_user_logout(
    pool: &State<PgPool>,
    session_config: &State<SessionConfig>,
    current_user: CurrentUser,
    cookies: &CookieJar<'_>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Some((session_id, _)) = cookies.get_private(SESSION_COOKIE).and_then(|c| parse_session_cookie_value(c.value())) {
        let repo = PostgresRepository { pool: pool.inner().clone() };
        AuthService::new(&repo, session_config.inner()).logout(&session_id, &current_user.id).await?;
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok(Json(MessageResponse::new("Logged out")))
}

#[openapi(tag = "Users")]
#[get("/me")]
pub async fn get_me(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.get_user_by_id(&current_user.id).await? {
        Some(user) => Ok(Json(UserResponse::from(&user))),
        None => Err(AppError::UserNotFound),
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![post_user_login, post_user_logout, get_me]
}

use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::user_role_from_db;
use crate::error::app_error::AppError;
use rocket::http::Status;
use rocket::outcome::{Outcome, try_outcome};
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::UserRole;

/// Name of the private cookie carrying `<session id>:<user id>`.
pub const SESSION_COOKIE: &str = "user";

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

pub(crate) fn session_cookie_value(session_id: &Uuid, user_id: &Uuid) -> String {
    format!("{}:{}", session_id, user_id)
}

pub(crate) fn parse_session_cookie_value(value: &str) -> Option<(Uuid, Uuid)> {
    let (session_id_str, user_id_str) = value.split_once(':')?;
    let session_id = Uuid::parse_str(session_id_str).ok()?;
    let user_id = Uuid::parse_str(user_id_str).ok()?;
    Some((session_id, user_id))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let cookies = req.cookies();
        if let Some(cookie) = cookies.get_private(SESSION_COOKIE)
            && let Some((session_id, user_id)) = parse_session_cookie_value(cookie.value())
        {
            let pool = match req.rocket().state::<PgPool>() {
                Some(pool) => pool,
                None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
            };

            let repo = PostgresRepository { pool: pool.clone() };

            match repo.get_active_session_user(&session_id, &user_id).await {
                Ok(Some(user)) => {
                    let role = match user_role_from_db(&user.role) {
                        Ok(role) => role,
                        Err(err) => return Outcome::Error((Status::InternalServerError, err)),
                    };
                    let current_user = CurrentUser {
                        id: user.id,
                        email: user.email,
                        role,
                    };
                    req.local_cache(|| Some(current_user.clone()));
                    return Outcome::Success(current_user);
                }
                Ok(None) => {
                    let _ = repo.delete_session_if_expired(&session_id).await;
                    return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
                }
                Err(err) => return Outcome::Error((Status::InternalServerError, err)),
            }
        }

        Outcome::Error((Status::Unauthorized, AppError::Unauthorized))
    }
}

/// An authenticated user holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let user = try_outcome!(req.guard::<CurrentUser>().await);
        if user.is_admin() {
            Outcome::Success(AdminUser(user))
        } else {
            Outcome::Error((Status::Forbidden, AppError::Forbidden))
        }
    }
}

fn cookie_security_input() -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some("Cookie-based authentication. Log in via POST /api/users/login to obtain the session cookie.".to_string()),
        data: SecuritySchemeData::ApiKey {
            name: SESSION_COOKIE.to_string(),
            location: "cookie".to_string(),
        },
        extensions: Object::default(),
    };

    let mut security_req = SecurityRequirement::new();
    security_req.insert("cookieAuth".to_string(), Vec::new());

    RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req)
}

fn guard_responses(codes: &[(&str, &str)]) -> Responses {
    use rocket_okapi::okapi::openapi3::{RefOr, Response};
    let mut responses = Responses::default();
    for (code, description) in codes {
        responses.responses.insert(
            code.to_string(),
            RefOr::Object(Response {
                description: description.to_string(),
                ..Default::default()
            }),
        );
    }
    responses
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security_input())
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(guard_responses(&[("401", "Unauthorized - Authentication required")]))
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security_input())
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(guard_responses(&[
            ("401", "Unauthorized - Authentication required"),
            ("403", "Forbidden - Admin privileges required"),
        ]))
    }
}

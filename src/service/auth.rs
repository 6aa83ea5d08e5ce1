use crate::config::SessionConfig;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{LoginRequest, User};
use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

/// A successful login: the new session and the user it belongs to.
pub struct LoginOutcome {
    pub session_id: Uuid,
    pub user: User,
}

pub fn session_expiry(now: DateTime<Utc>, config: &SessionConfig) -> DateTime<Utc> {
    now + Duration::hours(config.ttl_hours.max(1))
}

pub struct AuthService<'a> {
    pub repo: &'a PostgresRepository,
    pub session: &'a SessionConfig,
}

impl<'a> AuthService<'a> {
    pub fn new(repo: &'a PostgresRepository, session: &'a SessionConfig) -> Self {
        Self { repo, session }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.repo.get_user_by_email(&request.email).await? else {
            PostgresRepository::dummy_verify(&request.password);
            return Err(AppError::InvalidCredentials);
        };

        PostgresRepository::verify_password(&user, &request.password)?;
        check_not_suspended(&user)?;

        let session = self.repo.create_session(&user.id, session_expiry(Utc::now(), self.session)).await?;
        info!(user_id = %user.id, "user logged in");

        Ok(LoginOutcome {
            session_id: session.id,
            user,
        })
    }

    pub async fn logout(&self, session_id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        self.repo.delete_session(session_id, user_id).await
    }
}

fn check_not_suspended(user: &User) -> Result<(), AppError> {
    if user.suspended { Err(AppError::AccountSuspended) } else { Ok(()) }
}

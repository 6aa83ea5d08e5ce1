use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{User, UserRole};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// A real Argon2 hash generated once, used as a timing decoy so that logins for
/// unknown emails take as long as logins for existing users.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    suspended: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: user_role_from_db(&row.role)?,
            suspended: row.suspended,
            created_at: row.created_at,
        })
    }
}

pub(crate) const USER_SELECT_FIELDS: &str = "id, username, email, password_hash, role, suspended, created_at";

pub fn user_role_from_db<T: AsRef<str>>(value: T) -> Result<UserRole, AppError> {
    match value.as_ref() {
        "user" => Ok(UserRole::User),
        "admin" => Ok(UserRole::Admin),
        other => Err(AppError::from(sqlx::Error::Decode(format!("Unknown user role: {}", other).into()))),
    }
}

impl PostgresRepository {
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE email = $1
            "#,
            USER_SELECT_FIELDS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE id = $1
            "#,
            USER_SELECT_FIELDS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    pub fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
        let password_hash = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)
    }

    /// Throwaway Argon2 verification so unknown accounts cannot be told apart by latency.
    pub fn dummy_verify(password: &str) {
        if let Some(hash) = DUMMY_HASH.as_deref().and_then(|hash| PasswordHash::new(hash).ok()) {
            let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt).unwrap().to_string();
        User {
            id: Uuid::new_v4(),
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
            password_hash: hash,
            role: UserRole::User,
            suspended: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verify_password_accepts_correct_password() {
        let user = user_with_password("correct horse");
        assert!(PostgresRepository::verify_password(&user, "correct horse").is_ok());
    }

    #[test]
    fn verify_password_rejects_wrong_password() {
        let user = user_with_password("correct horse");
        let err = PostgresRepository::verify_password(&user, "battery staple").unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn user_role_from_db_all_roles() {
        assert_eq!(user_role_from_db("user").unwrap(), UserRole::User);
        assert_eq!(user_role_from_db("admin").unwrap(), UserRole::Admin);
        assert!(user_role_from_db("root").is_err());
    }

    #[test]
    fn dummy_hash_is_generated() {
        assert!(DUMMY_HASH.is_some());
        PostgresRepository::dummy_verify("anything");
    }
}

use sqlx::PgPool;

/// Request-scoped handle over the shared pool. Every query takes the owning user id
/// explicitly.
#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}

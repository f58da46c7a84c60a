//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, every
//! collection is persisted and hydrated on startup. When absent, the API
//! runs in in-memory-only mode (development and tests).
//!
//! Each table module exposes `upsert`, `delete` and `load_all`. Writes are
//! full-row upserts keyed by `id`, so create and update share one path.

pub mod beers;
pub mod customers;
pub mod events;
pub mod kegs;
pub mod partners;
pub mod rentals;

use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. State will not survive restarts."
            );
            return Ok(None);
        }
    };
    connect(&url).await.map(Some)
}

/// Connect to `url` and apply the embedded migrations.
pub async fn connect(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;
    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}

/// `SELECT 1` against the pool, for the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Delete one row by id from `table`. Returns whether a row was removed.
///
/// `table` is always one of this module's fixed table names.
async fn delete_by_id(pool: &PgPool, table: &'static str, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Keg persistence operations on the `kegs` table.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::state::KegRecord;

/// Insert a keg, or replace everything but its stock count.
///
/// Stock on an existing row only moves through [`adjust_stock`] and
/// [`set_stock`], so a catalog edit never overwrites a rental's change.
pub async fn upsert<'e>(conn: impl PgExecutor<'e>, record: &KegRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO kegs (id, size, serves, ideal, price, stock, icon_size, img,
         description, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO UPDATE SET
           size = EXCLUDED.size, serves = EXCLUDED.serves, ideal = EXCLUDED.ideal,
           price = EXCLUDED.price,
           icon_size = EXCLUDED.icon_size, img = EXCLUDED.img,
           description = EXCLUDED.description, is_active = EXCLUDED.is_active,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(&record.size)
    .bind(&record.serves)
    .bind(&record.ideal)
    .bind(&record.price)
    .bind(record.stock)
    .bind(record.icon_size)
    .bind(&record.img)
    .bind(&record.description)
    .bind(record.is_active)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Add `delta` to a keg's stock after a rental moved kegs.
///
/// The change is applied relative to the stored count, so concurrent
/// rentals land in any order and still sum to the in-memory count.
pub async fn adjust_stock<'e>(
    conn: impl PgExecutor<'e>,
    id: Uuid,
    delta: i64,
    updated_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE kegs SET stock = stock + $1, updated_at = $2 WHERE id = $3")
            .bind(delta)
            .bind(updated_at)
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite a keg's stock (manual correction after a physical count).
pub async fn set_stock<'e>(
    conn: impl PgExecutor<'e>,
    id: Uuid,
    stock: i64,
    updated_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE kegs SET stock = $1, updated_at = $2 WHERE id = $3")
        .bind(stock)
        .bind(updated_at)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "kegs", id).await
}

/// Remove every keg (catalog reseed).
pub async fn delete_all<'e>(conn: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM kegs").execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<KegRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, KegRow>(
        "SELECT id, size, serves, ideal, price, stock, icon_size, img,
         description, is_active, created_at, updated_at
         FROM kegs ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(KegRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct KegRow {
    id: Uuid,
    size: String,
    serves: Option<String>,
    ideal: Option<String>,
    price: String,
    stock: i64,
    icon_size: Option<i32>,
    img: Option<String>,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KegRow {
    fn into_record(self) -> KegRecord {
        KegRecord {
            id: self.id,
            size: self.size,
            serves: self.serves,
            ideal: self.ideal,
            price: self.price,
            stock: self.stock,
            icon_size: self.icon_size,
            img: self.img,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

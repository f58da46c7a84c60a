//! Beer persistence operations on the `beers` table.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::state::{BeerImages, BeerRecord, BeerSpecs};

/// Insert or fully replace a beer.
pub async fn upsert<'e>(conn: impl PgExecutor<'e>, record: &BeerRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO beers (id, legacy_id, name, title_img, persona, category, style,
         specs, color, images, tags, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
           legacy_id = EXCLUDED.legacy_id, name = EXCLUDED.name,
           title_img = EXCLUDED.title_img, persona = EXCLUDED.persona,
           category = EXCLUDED.category, style = EXCLUDED.style,
           specs = EXCLUDED.specs, color = EXCLUDED.color,
           images = EXCLUDED.images, tags = EXCLUDED.tags,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(record.legacy_id)
    .bind(&record.name)
    .bind(&record.title_img)
    .bind(&record.persona)
    .bind(&record.category)
    .bind(&record.style)
    .bind(Json(&record.specs))
    .bind(&record.color)
    .bind(Json(&record.images))
    .bind(Json(&record.tags))
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "beers", id).await
}

/// Remove every beer (catalog reseed).
pub async fn delete_all<'e>(conn: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM beers").execute(conn).await?;
    Ok(result.rows_affected())
}

/// Load all beers, in catalog order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<BeerRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BeerRow>(
        "SELECT id, legacy_id, name, title_img, persona, category, style,
         specs, color, images, tags, created_at, updated_at
         FROM beers ORDER BY legacy_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(BeerRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct BeerRow {
    id: Uuid,
    legacy_id: i64,
    name: String,
    title_img: Option<String>,
    persona: Option<String>,
    category: Option<String>,
    style: Option<String>,
    specs: Json<BeerSpecs>,
    color: Option<String>,
    images: Json<BeerImages>,
    tags: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BeerRow {
    fn into_record(self) -> BeerRecord {
        BeerRecord {
            id: self.id,
            legacy_id: self.legacy_id,
            name: self.name,
            title_img: self.title_img,
            persona: self.persona,
            category: self.category,
            style: self.style,
            specs: self.specs.0,
            color: self.color,
            images: self.images.0,
            tags: self.tags.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

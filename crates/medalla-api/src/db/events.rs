//! Event persistence operations on the `events` table.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::state::{EventLocation, EventRecord};

/// Insert or fully replace an event.
pub async fn upsert<'e>(
    conn: impl PgExecutor<'e>,
    record: &EventRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (id, title, date, description, location, image,
         calendar_link, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO UPDATE SET
           title = EXCLUDED.title, date = EXCLUDED.date,
           description = EXCLUDED.description, location = EXCLUDED.location,
           image = EXCLUDED.image, calendar_link = EXCLUDED.calendar_link,
           is_active = EXCLUDED.is_active, updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(&record.title)
    .bind(record.date)
    .bind(&record.description)
    .bind(Json(&record.location))
    .bind(&record.image)
    .bind(&record.calendar_link)
    .bind(record.is_active)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "events", id).await
}

/// Remove every event (catalog reseed).
pub async fn delete_all<'e>(conn: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events").execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<EventRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT id, title, date, description, location, image,
         calendar_link, is_active, created_at, updated_at
         FROM events ORDER BY date",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(EventRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    date: DateTime<Utc>,
    description: Option<String>,
    location: Json<EventLocation>,
    image: Option<String>,
    calendar_link: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn into_record(self) -> EventRecord {
        EventRecord {
            id: self.id,
            title: self.title,
            date: self.date,
            description: self.description,
            location: self.location.0,
            image: self.image,
            calendar_link: self.calendar_link,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

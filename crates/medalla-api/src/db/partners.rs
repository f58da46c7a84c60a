//! Partner persistence operations on the `partners` table.
//!
//! The location is stored as two plain columns so it can be indexed or
//! queried from SQL; the address and contact blocks are JSONB.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use medalla_core::GeoPoint;

use crate::state::{PartnerAddress, PartnerContact, PartnerRecord};

/// Insert or fully replace a partner.
pub async fn upsert<'e>(
    conn: impl PgExecutor<'e>,
    record: &PartnerRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO partners (id, name, partner_type, lat, lng, location_details, contact,
         features, varieties, is_official, logo, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (id) DO UPDATE SET
           name = EXCLUDED.name, partner_type = EXCLUDED.partner_type,
           lat = EXCLUDED.lat, lng = EXCLUDED.lng,
           location_details = EXCLUDED.location_details, contact = EXCLUDED.contact,
           features = EXCLUDED.features, varieties = EXCLUDED.varieties,
           is_official = EXCLUDED.is_official, logo = EXCLUDED.logo,
           is_active = EXCLUDED.is_active, updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.partner_type)
    .bind(record.location.lat())
    .bind(record.location.lng())
    .bind(Json(&record.location_details))
    .bind(Json(&record.contact))
    .bind(Json(&record.features))
    .bind(Json(&record.varieties))
    .bind(record.is_official)
    .bind(&record.logo)
    .bind(record.is_active)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "partners", id).await
}

/// Remove every partner (catalog reseed).
pub async fn delete_all<'e>(conn: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM partners").execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<PartnerRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PartnerRow>(
        "SELECT id, name, partner_type, lat, lng, location_details, contact,
         features, varieties, is_official, logo, is_active, created_at, updated_at
         FROM partners ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(record) = row.into_record() {
            records.push(record);
        }
    }
    Ok(records)
}

#[derive(sqlx::FromRow)]
struct PartnerRow {
    id: Uuid,
    name: String,
    partner_type: String,
    lat: f64,
    lng: f64,
    location_details: Json<PartnerAddress>,
    contact: Json<PartnerContact>,
    features: Json<Vec<String>>,
    varieties: Json<Vec<String>>,
    is_official: bool,
    logo: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PartnerRow {
    fn into_record(self) -> Option<PartnerRecord> {
        let location = match GeoPoint::new(self.lat, self.lng) {
            Ok(point) => point,
            Err(e) => {
                tracing::error!(partner_id = %self.id, error = %e, "skipping partner row with invalid location");
                return None;
            }
        };
        Some(PartnerRecord {
            id: self.id,
            name: self.name,
            partner_type: self.partner_type,
            location,
            location_details: self.location_details.0,
            contact: self.contact.0,
            features: self.features.0,
            varieties: self.varieties.0,
            is_official: self.is_official,
            logo: self.logo,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

//! Rental persistence operations on the `rentals` table.
//!
//! Items are stored as a JSONB array; status and payment method as their
//! text labels.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use medalla_core::{PaymentMethod, RentalStatus};

use crate::state::{RentalItem, RentalRecord};

/// Insert or fully replace a rental.
pub async fn upsert<'e>(
    conn: impl PgExecutor<'e>,
    record: &RentalRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO rentals (id, pickup_date, return_date, customer_name, contact, items,
         amount, is_paid, payment_method, notes, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
           pickup_date = EXCLUDED.pickup_date, return_date = EXCLUDED.return_date,
           customer_name = EXCLUDED.customer_name, contact = EXCLUDED.contact,
           items = EXCLUDED.items, amount = EXCLUDED.amount, is_paid = EXCLUDED.is_paid,
           payment_method = EXCLUDED.payment_method, notes = EXCLUDED.notes,
           status = EXCLUDED.status, updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(record.pickup_date)
    .bind(record.return_date)
    .bind(&record.customer_name)
    .bind(&record.contact)
    .bind(Json(&record.items))
    .bind(record.amount)
    .bind(record.is_paid)
    .bind(record.payment_method.as_str())
    .bind(&record.notes)
    .bind(record.status.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "rentals", id).await
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<RentalRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RentalRow>(
        "SELECT id, pickup_date, return_date, customer_name, contact, items,
         amount, is_paid, payment_method, notes, status, created_at, updated_at
         FROM rentals ORDER BY created_at",
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
struct RentalRow {
    id: Uuid,
    pickup_date: Option<DateTime<Utc>>,
    return_date: Option<DateTime<Utc>>,
    customer_name: String,
    contact: Option<String>,
    items: Json<Vec<RentalItem>>,
    amount: Option<f64>,
    is_paid: bool,
    payment_method: String,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RentalRow {
    fn into_record(self) -> Option<RentalRecord> {
        let status = match self.status.parse::<RentalStatus>() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(rental_id = %self.id, error = %e, "skipping rental row with unknown status");
                return None;
            }
        };
        let payment_method = self.payment_method.parse::<PaymentMethod>().unwrap_or_else(|e| {
            tracing::warn!(rental_id = %self.id, error = %e, "unknown payment method, using default");
            PaymentMethod::default()
        });
        Some(RentalRecord {
            id: self.id,
            pickup_date: self.pickup_date,
            return_date: self.return_date,
            customer_name: self.customer_name,
            contact: self.contact,
            items: self.items.0,
            amount: self.amount,
            is_paid: self.is_paid,
            payment_method,
            notes: self.notes,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

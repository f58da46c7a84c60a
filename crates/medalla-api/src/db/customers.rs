//! Customer persistence operations on the `customers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::CustomerRecord;

/// Insert or fully replace a customer.
pub async fn upsert(pool: &PgPool, record: &CustomerRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customers (id, name, phone, email, address, total_rentals,
         last_rental_date, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO UPDATE SET
           name = EXCLUDED.name, phone = EXCLUDED.phone, email = EXCLUDED.email,
           address = EXCLUDED.address, total_rentals = EXCLUDED.total_rentals,
           last_rental_date = EXCLUDED.last_rental_date, notes = EXCLUDED.notes,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.phone)
    .bind(&record.email)
    .bind(&record.address)
    .bind(record.total_rentals)
    .bind(record.last_rental_date)
    .bind(&record.notes)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    super::delete_by_id(pool, "customers", id).await
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<CustomerRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, name, phone, email, address, total_rentals,
         last_rental_date, notes, created_at, updated_at
         FROM customers ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(CustomerRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    total_rentals: i64,
    last_rental_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_record(self) -> CustomerRecord {
        CustomerRecord {
            id: self.id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            total_rentals: self.total_rentals,
            last_rental_date: self.last_rental_date,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

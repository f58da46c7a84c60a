//! # Keg Rental API
//!
//! A rental takes kegs out of stock when it is created and puts them back
//! when it is marked `Devuelto`. Reverting a return takes them out again.
//!
//! ## Locking
//!
//! Stock checks and decrements run under the keg store's write lock, so two
//! concurrent orders cannot both pass the availability check. A status
//! change is planned and its stock moved while the rental store's write lock
//! is held, so two identical "mark as returned" requests restore stock once
//! and a rejected movement leaves the rental untouched. The keg lock is only
//! ever taken inside the rental lock, never the other way round.
//!
//! ## Persistence
//!
//! Stock reaches Postgres as relative adjustments, in the same transaction as
//! the rental row. When that transaction fails on create, the rental is
//! removed again and its kegs released, so a retried request books once.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use medalla_core::{PaymentMethod, RentalStatus, ValidationError};
use medalla_state::{
    apply_effect, check_initial_status, release, reserve, validate_lines, StatusChange,
    StockAdjustment, StockEffect, StockError, StockLine, StockMovement,
};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_opt, extract_validated_json, Validate};
use crate::state::{AppState, BeerRecord, KegRecord, RentalItem, RentalRecord};

use super::{check_required, persist_failed, MessageResponse};

// ── Requests ────────────────────────────────────────────────────────────────

/// Request to book kegs for a customer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRentalRequest {
    pub pickup_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub customer_name: String,
    /// Customer phone. Links the rental to a customer record.
    pub contact: Option<String>,
    pub items: Vec<RentalItem>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub is_paid: bool,
    /// `Efectivo` (default), `Transferencia` or `Otro`.
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// `Reservado` (default) or `Retirado`.
    pub status: Option<String>,
}

impl Validate for CreateRentalRequest {
    fn validate(&self) -> Result<(), String> {
        if self.customer_name.trim().is_empty() {
            return Err("customer_name must not be empty".to_string());
        }
        check_amount(self.amount)?;
        validate_lines(
            self.items
                .iter()
                .map(|item| (item.quantity, item.barrel_ids.len())),
        )
        .map_err(|e| e.to_string())
    }
}

/// Partial update of a rental. Items cannot be changed after creation.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRentalRequest {
    pub pickup_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub contact: Option<String>,
    pub amount: Option<f64>,
    pub is_paid: Option<bool>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl Validate for UpdateRentalRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("customer_name", self.customer_name.as_deref())?;
        check_amount(self.amount)
    }
}

fn check_amount(amount: Option<f64>) -> Result<(), String> {
    match amount {
        Some(a) if !a.is_finite() || a < 0.0 => {
            Err("amount must be a non-negative number".to_string())
        }
        _ => Ok(()),
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<RentalStatus>, ValidationError> {
    raw.map(|s| s.trim().parse()).transpose()
}

fn parse_payment(raw: Option<&str>) -> Result<Option<PaymentMethod>, ValidationError> {
    raw.map(|s| s.trim().parse()).transpose()
}

// ── Responses ───────────────────────────────────────────────────────────────

/// Keg summary embedded in a populated rental item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KegRef {
    pub id: Uuid,
    pub size: String,
    pub price: String,
}

/// Beer summary embedded in a populated rental item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeerRef {
    pub id: Uuid,
    pub legacy_id: i64,
    pub name: String,
}

/// A rental item with its keg and beer resolved. `keg` or `beer` is null
/// when the referenced record has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RentalItemDetail {
    pub keg_id: Uuid,
    pub keg: Option<KegRef>,
    pub beer_id: Option<Uuid>,
    pub beer: Option<BeerRef>,
    pub quantity: u32,
    pub barrel_ids: Vec<String>,
}

/// A rental with its items populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RentalDetail {
    pub id: Uuid,
    pub pickup_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub contact: Option<String>,
    pub items: Vec<RentalItemDetail>,
    pub amount: Option<f64>,
    pub is_paid: bool,
    #[schema(value_type = String, example = "Efectivo")]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[schema(value_type = String, example = "Reservado")]
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of the kegs and beers that rental items point at.
pub(crate) struct Lookup {
    kegs: HashMap<Uuid, KegRecord>,
    beers: HashMap<Uuid, BeerRecord>,
}

impl Lookup {
    pub(crate) fn snapshot(state: &AppState) -> Self {
        Self {
            kegs: state.kegs.list().into_iter().map(|k| (k.id, k)).collect(),
            beers: state.beers.list().into_iter().map(|b| (b.id, b)).collect(),
        }
    }

    pub(crate) fn populate(&self, rental: RentalRecord) -> RentalDetail {
        let items = rental
            .items
            .into_iter()
            .map(|item| RentalItemDetail {
                keg: self.kegs.get(&item.keg_id).map(|k| KegRef {
                    id: k.id,
                    size: k.size.clone(),
                    price: k.price.clone(),
                }),
                beer: item
                    .beer_id
                    .and_then(|id| self.beers.get(&id))
                    .map(|b| BeerRef {
                        id: b.id,
                        legacy_id: b.legacy_id,
                        name: b.name.clone(),
                    }),
                keg_id: item.keg_id,
                beer_id: item.beer_id,
                quantity: item.quantity,
                barrel_ids: item.barrel_ids,
            })
            .collect();
        RentalDetail {
            id: rental.id,
            pickup_date: rental.pickup_date,
            return_date: rental.return_date,
            customer_name: rental.customer_name,
            contact: rental.contact,
            items,
            amount: rental.amount,
            is_paid: rental.is_paid,
            payment_method: rental.payment_method,
            notes: rental.notes,
            status: rental.status,
            created_at: rental.created_at,
            updated_at: rental.updated_at,
        }
    }
}

/// Sort by pickup date, most recent first; rentals without one go last.
pub(crate) fn sort_by_pickup_desc(rentals: &mut [RentalRecord]) {
    rentals.sort_by(|a, b| match (a.pickup_date, b.pickup_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    });
}

/// Sort and populate a set of rentals for display.
pub(crate) fn populate_sorted(state: &AppState, mut rentals: Vec<RentalRecord>) -> Vec<RentalDetail> {
    sort_by_pickup_desc(&mut rentals);
    let lookup = Lookup::snapshot(state);
    rentals.into_iter().map(|r| lookup.populate(r)).collect()
}

// ── Stock bookkeeping ───────────────────────────────────────────────────────

fn touch(kegs: &mut HashMap<Uuid, KegRecord>, adjustments: &[StockAdjustment], now: DateTime<Utc>) {
    for adjustment in adjustments {
        if let Some(keg) = kegs.get_mut(&adjustment.keg_id) {
            keg.updated_at = now;
        }
    }
}

/// Check and take stock for a new order under the keg write lock.
fn reserve_stock(
    state: &AppState,
    lines: &[StockLine],
    now: DateTime<Utc>,
) -> Result<Vec<StockAdjustment>, StockError> {
    state.kegs.with_write(|kegs| {
        let adjustments = reserve(kegs, lines)?;
        touch(kegs, &adjustments, now);
        Ok(adjustments)
    })
}

/// Apply a status change's stock effect under the keg write lock.
fn move_stock(
    state: &AppState,
    rental_id: Uuid,
    lines: &[StockLine],
    effect: StockEffect,
    now: DateTime<Utc>,
) -> Result<StockMovement, StockError> {
    let movement = state.kegs.with_write(|kegs| {
        let movement = apply_effect(kegs, lines, effect)?;
        touch(kegs, &movement.adjustments, now);
        Ok::<_, StockError>(movement)
    })?;

    for keg_id in &movement.missing {
        tracing::warn!(rental_id = %rental_id, keg_id = %keg_id, "rental references a deleted keg; stock not adjusted");
    }
    for adjustment in movement.adjustments.iter().filter(|a| a.went_negative()) {
        tracing::warn!(
            rental_id = %rental_id,
            keg_id = %adjustment.keg_id,
            stock = adjustment.after,
            "keg stock went negative after reverting a return"
        );
    }
    if !movement.is_empty() {
        let label = match effect {
            StockEffect::Restore => "restore",
            StockEffect::Withdraw => "withdraw",
            StockEffect::None => "none",
        };
        metrics::counter!("medalla_stock_movements_total", "effect" => label).increment(1);
    }
    Ok(movement)
}

/// Write a rental and its stock adjustments in one transaction.
async fn persist_rental(
    state: &AppState,
    record: &RentalRecord,
    adjustments: &[StockAdjustment],
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let Some(pool) = &state.db_pool else {
        return Ok(());
    };
    let failed = |e: sqlx::Error| persist_failed("rental", record.id, e);

    let mut tx = pool.begin().await.map_err(failed)?;
    for adjustment in adjustments {
        crate::db::kegs::adjust_stock(&mut *tx, adjustment.keg_id, adjustment.delta(), now)
            .await
            .map_err(failed)?;
    }
    crate::db::rentals::upsert(&mut *tx, record)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)
}

/// Undo an in-memory create whose write-through failed.
fn discard_rental(state: &AppState, record: &RentalRecord, now: DateTime<Utc>) {
    state.rentals.remove(&record.id);
    let released = state.kegs.with_write(|kegs| {
        let movement = release(kegs, &record.stock_lines())?;
        touch(kegs, &movement.adjustments, now);
        Ok::<_, StockError>(movement)
    });
    match released {
        Ok(_) => tracing::warn!(rental_id = %record.id, "rental discarded after a failed write; stock released"),
        Err(e) => tracing::error!(rental_id = %record.id, error = %e, "rental discarded but its stock could not be released"),
    }
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the rentals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/rentals", get(list_rentals).post(create_rental))
        .route("/api/rentals/{id}", put(update_rental).delete(delete_rental))
}

/// GET /api/rentals: Every rental, populated.
#[utoipa::path(
    get,
    path = "/api/rentals",
    responses(
        (status = 200, description = "Rentals, most recent pickup first", body = Vec<RentalDetail>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
    ),
    tag = "rentals"
)]
async fn list_rentals(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Json<Vec<RentalDetail>> {
    Json(populate_sorted(&state, state.rentals.list()))
}

/// POST /api/rentals: Book kegs and take them out of stock.
#[utoipa::path(
    post,
    path = "/api/rentals",
    request_body = CreateRentalRequest,
    responses(
        (status = 201, description = "Rental created", body = RentalDetail),
        (status = 409, description = "Insufficient stock", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed or unknown keg", body = crate::error::ErrorBody),
    ),
    tag = "rentals"
)]
async fn create_rental(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreateRentalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RentalDetail>), AppError> {
    let req = extract_validated_json(body)?;
    let status = parse_status(req.status.as_deref())?.unwrap_or_default();
    check_initial_status(status)?;
    let payment_method = parse_payment(req.payment_method.as_deref())?.unwrap_or_default();

    if let Some(beer_id) = req
        .items
        .iter()
        .filter_map(|item| item.beer_id)
        .find(|id| !state.beers.contains(id))
    {
        return Err(AppError::Validation(format!("beer {beer_id} not found")));
    }

    let now = Utc::now();
    let record = RentalRecord {
        id: Uuid::new_v4(),
        pickup_date: req.pickup_date,
        return_date: req.return_date,
        customer_name: req.customer_name.trim().to_string(),
        contact: clean_opt(req.contact),
        items: req.items,
        amount: req.amount,
        is_paid: req.is_paid,
        payment_method,
        notes: clean_opt(req.notes),
        status,
        created_at: now,
        updated_at: now,
    };

    let adjustments = reserve_stock(&state, &record.stock_lines(), now)?;
    state.rentals.insert(record.id, record.clone());

    if let Err(err) = persist_rental(&state, &record, &adjustments, now).await {
        discard_rental(&state, &record, now);
        return Err(err);
    }

    super::customers::record_rental(&state, &record).await;

    metrics::counter!("medalla_rentals_created_total").increment(1);
    tracing::info!(
        rental_id = %record.id,
        customer = %record.customer_name,
        kegs = adjustments.iter().map(|a| -a.delta()).sum::<i64>(),
        "rental created"
    );

    let detail = Lookup::snapshot(&state).populate(record);
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/rentals/{id}: Update a rental; status changes move stock.
#[utoipa::path(
    put,
    path = "/api/rentals/{id}",
    params(("id" = Uuid, Path, description = "Rental ID")),
    request_body = UpdateRentalRequest,
    responses(
        (status = 200, description = "Rental updated", body = RentalDetail),
        (status = 404, description = "Rental not found", body = crate::error::ErrorBody),
        (status = 409, description = "Stock would leave its allowed range", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "rentals"
)]
async fn update_rental(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateRentalRequest>, JsonRejection>,
) -> Result<Json<RentalDetail>, AppError> {
    let req = extract_validated_json(body)?;
    let requested_status = parse_status(req.status.as_deref())?;
    let payment_method = parse_payment(req.payment_method.as_deref())?;
    let now = Utc::now();

    // The status decision, the stock movement and the field update happen
    // under the rental lock.
    let (record, change, movement) = state
        .rentals
        .try_update(&id, |rental| -> Result<_, AppError> {
            let change = StatusChange::plan(rental.status, requested_status.unwrap_or(rental.status));
            let movement = move_stock(&state, id, &rental.stock_lines(), change.stock, now)?;
            rental.return_date = change.resolve_return_date(rental.return_date, req.return_date, now);
            rental.status = change.to;
            if req.pickup_date.is_some() {
                rental.pickup_date = req.pickup_date;
            }
            if let Some(name) = &req.customer_name {
                rental.customer_name = name.trim().to_string();
            }
            if req.contact.is_some() {
                rental.contact = clean_opt(req.contact.clone());
            }
            if req.amount.is_some() {
                rental.amount = req.amount;
            }
            if let Some(paid) = req.is_paid {
                rental.is_paid = paid;
            }
            if let Some(method) = payment_method {
                rental.payment_method = method;
            }
            if req.notes.is_some() {
                rental.notes = clean_opt(req.notes.clone());
            }
            rental.updated_at = now;
            Ok((rental.clone(), change, movement))
        })
        .ok_or_else(|| AppError::NotFound(format!("rental {id} not found")))??;

    persist_rental(&state, &record, &movement.adjustments, now).await?;

    if change.is_status_change() {
        tracing::info!(
            rental_id = %id,
            from = %change.from,
            to = %change.to,
            stock = ?change.stock,
            "rental status changed"
        );
    }

    Ok(Json(Lookup::snapshot(&state).populate(record)))
}

/// DELETE /api/rentals/{id}: Remove a rental (admin role). Stock is not restored.
#[utoipa::path(
    delete,
    path = "/api/rentals/{id}",
    params(("id" = Uuid, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Rental not found", body = crate::error::ErrorBody),
    ),
    tag = "rentals"
)]
async fn delete_rental(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    let removed = state
        .rentals
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("rental {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::rentals::delete(pool, id)
            .await
            .map_err(|e| persist_failed("rental", id, e))?;
    }

    if removed.status.holds_stock() {
        tracing::warn!(rental_id = %id, status = %removed.status, "deleted a rental that still holds kegs; stock not restored");
    } else {
        tracing::info!(rental_id = %id, "rental deleted");
    }
    Ok(Json(MessageResponse::new("Rental deleted")))
}

//! # Keg API
//!
//! Keg sizes offered for rent and their stock count. Stock moves with
//! rentals (see [`super::rentals`]); the update endpoint here is for manual
//! corrections after a physical count.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use medalla_state::MAX_STOCK;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_opt, extract_validated_json, Validate};
use crate::state::{AppState, KegRecord};

use super::{check_required, persist_failed, MessageResponse};

/// Price shown when a keg has no published price.
pub const DEFAULT_PRICE: &str = "Consultar";

/// Request to add a keg size.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateKegRequest {
    pub size: String,
    pub serves: Option<String>,
    pub ideal: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub stock: i64,
    pub icon_size: Option<i32>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for CreateKegRequest {
    fn validate(&self) -> Result<(), String> {
        if self.size.trim().is_empty() {
            return Err("size must not be empty".to_string());
        }
        check_stock(Some(self.stock))
    }
}

impl CreateKegRequest {
    pub fn into_record(self, now: DateTime<Utc>) -> KegRecord {
        KegRecord {
            id: Uuid::new_v4(),
            size: self.size.trim().to_string(),
            serves: clean_opt(self.serves),
            ideal: clean_opt(self.ideal),
            price: clean_opt(self.price).unwrap_or_else(|| DEFAULT_PRICE.to_string()),
            stock: self.stock,
            icon_size: self.icon_size,
            img: clean_opt(self.img),
            description: clean_opt(self.description),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a keg, including manual stock corrections.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateKegRequest {
    pub size: Option<String>,
    pub serves: Option<String>,
    pub ideal: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i64>,
    pub icon_size: Option<i32>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateKegRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("size", self.size.as_deref())?;
        check_stock(self.stock)
    }
}

impl UpdateKegRequest {
    fn apply(self, keg: &mut KegRecord, now: DateTime<Utc>) {
        if let Some(size) = self.size {
            keg.size = size.trim().to_string();
        }
        if self.serves.is_some() {
            keg.serves = clean_opt(self.serves);
        }
        if self.ideal.is_some() {
            keg.ideal = clean_opt(self.ideal);
        }
        if let Some(price) = self.price {
            keg.price = clean_opt(Some(price)).unwrap_or_else(|| DEFAULT_PRICE.to_string());
        }
        if let Some(stock) = self.stock {
            keg.stock = stock;
        }
        if self.icon_size.is_some() {
            keg.icon_size = self.icon_size;
        }
        if self.img.is_some() {
            keg.img = clean_opt(self.img);
        }
        if self.description.is_some() {
            keg.description = clean_opt(self.description);
        }
        if let Some(active) = self.is_active {
            keg.is_active = active;
        }
        keg.updated_at = now;
    }
}

fn check_stock(stock: Option<i64>) -> Result<(), String> {
    match stock {
        Some(n) if n < 0 => Err("stock must not be negative".to_string()),
        Some(n) if n > MAX_STOCK => Err(format!("stock must not exceed {MAX_STOCK}")),
        _ => Ok(()),
    }
}

/// Build the kegs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/kegs", get(list_active_kegs).post(create_keg))
        .route("/api/kegs/all", get(list_all_kegs))
        .route("/api/kegs/{id}", put(update_keg).delete(delete_keg))
}

/// GET /api/kegs: Kegs currently offered.
#[utoipa::path(
    get,
    path = "/api/kegs",
    responses(
        (status = 200, description = "Active kegs", body = Vec<KegRecord>),
    ),
    tag = "kegs"
)]
async fn list_active_kegs(State(state): State<AppState>) -> Json<Vec<KegRecord>> {
    let mut kegs: Vec<KegRecord> = state.kegs.list().into_iter().filter(|k| k.is_active).collect();
    sort_kegs(&mut kegs);
    Json(kegs)
}

/// GET /api/kegs/all: Every keg, active or not.
#[utoipa::path(
    get,
    path = "/api/kegs/all",
    responses(
        (status = 200, description = "All kegs", body = Vec<KegRecord>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
    ),
    tag = "kegs"
)]
async fn list_all_kegs(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Json<Vec<KegRecord>> {
    let mut kegs = state.kegs.list();
    sort_kegs(&mut kegs);
    Json(kegs)
}

/// Stable listing order: by creation, then size.
fn sort_kegs(kegs: &mut [KegRecord]) {
    kegs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.size.cmp(&b.size)));
}

/// POST /api/kegs: Add a keg size.
#[utoipa::path(
    post,
    path = "/api/kegs",
    request_body = CreateKegRequest,
    responses(
        (status = 201, description = "Keg created", body = KegRecord),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "kegs"
)]
async fn create_keg(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreateKegRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<KegRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let record = req.into_record(Utc::now());
    state.kegs.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::kegs::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("keg", record.id, e))?;
    }

    tracing::info!(keg_id = %record.id, size = %record.size, stock = record.stock, "keg created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/kegs/{id}: Partial update.
#[utoipa::path(
    put,
    path = "/api/kegs/{id}",
    params(("id" = Uuid, Path, description = "Keg ID")),
    request_body = UpdateKegRequest,
    responses(
        (status = 200, description = "Keg updated", body = KegRecord),
        (status = 404, description = "Keg not found", body = crate::error::ErrorBody),
    ),
    tag = "kegs"
)]
async fn update_keg(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateKegRequest>, JsonRejection>,
) -> Result<Json<KegRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let stock_correction = req.stock;
    let now = Utc::now();

    let record = state
        .kegs
        .update(&id, |keg| req.apply(keg, now))
        .ok_or_else(|| AppError::NotFound(format!("keg {id} not found")))?;

    if let Some(stock) = stock_correction {
        tracing::info!(keg_id = %id, stock, "keg stock corrected manually");
    }

    if let Some(pool) = &state.db_pool {
        crate::db::kegs::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("keg", id, e))?;
        if stock_correction.is_some() {
            crate::db::kegs::set_stock(pool, id, record.stock, now)
                .await
                .map_err(|e| persist_failed("keg", id, e))?;
        }
    }

    Ok(Json(record))
}

/// DELETE /api/kegs/{id}: Remove a keg (admin role).
#[utoipa::path(
    delete,
    path = "/api/kegs/{id}",
    params(("id" = Uuid, Path, description = "Keg ID")),
    responses(
        (status = 200, description = "Keg deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Keg not found", body = crate::error::ErrorBody),
    ),
    tag = "kegs"
)]
async fn delete_keg(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    state
        .kegs
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("keg {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::kegs::delete(pool, id)
            .await
            .map_err(|e| persist_failed("keg", id, e))?;
    }

    tracing::info!(keg_id = %id, "keg deleted");
    Ok(Json(MessageResponse::new("Keg deleted")))
}

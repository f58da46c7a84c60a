//! # Beer Catalog API
//!
//! Public reads of the beer catalog and admin writes. Beers carry a stable
//! numeric `legacy_id` used by public links; `GET /api/beers/{id}` accepts
//! either that number or the UUID.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_list, clean_opt, extract_validated_json, Validate};
use crate::state::{AppState, BeerImages, BeerRecord, BeerSpecs};

use super::{check_len, check_required, persist_failed, MessageResponse};

const MAX_NAME_LEN: usize = 200;

/// Request to add a beer to the catalog.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBeerRequest {
    /// Catalog number. Assigned as max + 1 when omitted.
    pub legacy_id: Option<i64>,
    pub name: String,
    pub title_img: Option<String>,
    pub persona: Option<String>,
    pub category: Option<String>,
    pub style: Option<String>,
    #[serde(default)]
    pub specs: BeerSpecs,
    pub color: Option<String>,
    #[serde(default)]
    pub images: BeerImages,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for CreateBeerRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        check_len("name", &self.name, MAX_NAME_LEN)?;
        check_legacy_id(self.legacy_id)?;
        check_specs(&self.specs)
    }
}

impl CreateBeerRequest {
    /// Build the stored record with the given catalog number.
    pub fn into_record(self, legacy_id: i64, now: DateTime<Utc>) -> BeerRecord {
        BeerRecord {
            id: Uuid::new_v4(),
            legacy_id,
            name: self.name.trim().to_string(),
            title_img: clean_opt(self.title_img),
            persona: clean_opt(self.persona),
            category: clean_opt(self.category),
            style: clean_opt(self.style),
            specs: self.specs,
            color: clean_opt(self.color),
            images: self.images,
            tags: clean_list(self.tags),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a beer. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBeerRequest {
    pub legacy_id: Option<i64>,
    pub name: Option<String>,
    pub title_img: Option<String>,
    pub persona: Option<String>,
    pub category: Option<String>,
    pub style: Option<String>,
    pub specs: Option<BeerSpecs>,
    pub color: Option<String>,
    pub images: Option<BeerImages>,
    pub tags: Option<Vec<String>>,
}

impl Validate for UpdateBeerRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("name", self.name.as_deref())?;
        if let Some(name) = &self.name {
            check_len("name", name, MAX_NAME_LEN)?;
        }
        check_legacy_id(self.legacy_id)?;
        match &self.specs {
            Some(specs) => check_specs(specs),
            None => Ok(()),
        }
    }
}

impl UpdateBeerRequest {
    fn apply(self, beer: &mut BeerRecord, now: DateTime<Utc>) {
        if let Some(legacy_id) = self.legacy_id {
            beer.legacy_id = legacy_id;
        }
        if let Some(name) = self.name {
            beer.name = name.trim().to_string();
        }
        if self.title_img.is_some() {
            beer.title_img = clean_opt(self.title_img);
        }
        if self.persona.is_some() {
            beer.persona = clean_opt(self.persona);
        }
        if self.category.is_some() {
            beer.category = clean_opt(self.category);
        }
        if self.style.is_some() {
            beer.style = clean_opt(self.style);
        }
        if let Some(specs) = self.specs {
            beer.specs = specs;
        }
        if self.color.is_some() {
            beer.color = clean_opt(self.color);
        }
        if let Some(images) = self.images {
            beer.images = images;
        }
        if let Some(tags) = self.tags {
            beer.tags = clean_list(tags);
        }
        beer.updated_at = now;
    }
}

/// Largest catalog number a beer may carry.
pub const MAX_LEGACY_ID: i64 = i32::MAX as i64;

fn check_legacy_id(legacy_id: Option<i64>) -> Result<(), String> {
    match legacy_id {
        Some(n) if !(1..=MAX_LEGACY_ID).contains(&n) => Err(format!(
            "legacy_id must be an integer between 1 and {MAX_LEGACY_ID}"
        )),
        _ => Ok(()),
    }
}

fn check_specs(specs: &BeerSpecs) -> Result<(), String> {
    for (field, value) in [("specs.ibu", specs.ibu), ("specs.srm", specs.srm)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{field} must be a non-negative number"));
            }
        }
    }
    Ok(())
}

/// Next free catalog number, or `None` once the highest number in use is
/// [`MAX_LEGACY_ID`].
pub fn next_legacy_id<'a>(beers: impl IntoIterator<Item = &'a BeerRecord>) -> Option<i64> {
    let next = beers.into_iter().map(|b| b.legacy_id).max().unwrap_or(0).checked_add(1)?;
    (next <= MAX_LEGACY_ID).then_some(next)
}

/// Build the beers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/beers", get(list_beers).post(create_beer))
        .route(
            "/api/beers/{id}",
            get(get_beer).put(update_beer).delete(delete_beer),
        )
}

/// GET /api/beers: The catalog in catalog order.
#[utoipa::path(
    get,
    path = "/api/beers",
    responses(
        (status = 200, description = "Beers sorted by legacy_id", body = Vec<BeerRecord>),
    ),
    tag = "beers"
)]
async fn list_beers(State(state): State<AppState>) -> Json<Vec<BeerRecord>> {
    let mut beers = state.beers.list();
    beers.sort_by_key(|b| b.legacy_id);
    Json(beers)
}

/// GET /api/beers/{id}: One beer by catalog number or UUID.
#[utoipa::path(
    get,
    path = "/api/beers/{id}",
    params(("id" = String, Path, description = "Numeric legacy id or UUID")),
    responses(
        (status = 200, description = "Beer found", body = BeerRecord),
        (status = 400, description = "Malformed id", body = crate::error::ErrorBody),
        (status = 404, description = "Beer not found", body = crate::error::ErrorBody),
    ),
    tag = "beers"
)]
async fn get_beer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BeerRecord>, AppError> {
    let id = id.trim();
    let found = if let Ok(legacy_id) = id.parse::<i64>() {
        state.beers.find(|b| b.legacy_id == legacy_id)
    } else if let Ok(uuid) = id.parse::<Uuid>() {
        state.beers.get(&uuid)
    } else {
        return Err(AppError::BadRequest(format!(
            "beer id must be a number or a UUID, got '{id}'"
        )));
    };
    found
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("beer {id} not found")))
}

/// POST /api/beers: Add a beer.
#[utoipa::path(
    post,
    path = "/api/beers",
    request_body = CreateBeerRequest,
    responses(
        (status = 201, description = "Beer created", body = BeerRecord),
        (status = 409, description = "legacy_id already taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "beers"
)]
async fn create_beer(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreateBeerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BeerRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();

    // Numbering and the uniqueness check share the write lock.
    let record = state.beers.with_write(|beers| {
        let legacy_id = match req.legacy_id {
            Some(n) if beers.values().any(|b| b.legacy_id == n) => {
                return Err(AppError::Conflict(format!("legacy_id {n} is already taken")));
            }
            Some(n) => n,
            None => next_legacy_id(beers.values()).ok_or_else(|| {
                AppError::Conflict("no catalog number left; pass legacy_id explicitly".to_string())
            })?,
        };
        let record = req.into_record(legacy_id, now);
        beers.insert(record.id, record.clone());
        Ok(record)
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::beers::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("beer", record.id, e))?;
    }

    tracing::info!(beer_id = %record.id, legacy_id = record.legacy_id, "beer created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/beers/{id}: Partial update.
#[utoipa::path(
    put,
    path = "/api/beers/{id}",
    params(("id" = Uuid, Path, description = "Beer ID")),
    request_body = UpdateBeerRequest,
    responses(
        (status = 200, description = "Beer updated", body = BeerRecord),
        (status = 404, description = "Beer not found", body = crate::error::ErrorBody),
        (status = 409, description = "legacy_id already taken", body = crate::error::ErrorBody),
    ),
    tag = "beers"
)]
async fn update_beer(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateBeerRequest>, JsonRejection>,
) -> Result<Json<BeerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();

    let record = state.beers.with_write(|beers| {
        if let Some(n) = req.legacy_id {
            if beers.values().any(|b| b.legacy_id == n && b.id != id) {
                return Err(AppError::Conflict(format!("legacy_id {n} is already taken")));
            }
        }
        let beer = beers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("beer {id} not found")))?;
        req.apply(beer, now);
        Ok(beer.clone())
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::beers::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("beer", id, e))?;
    }

    Ok(Json(record))
}

/// DELETE /api/beers/{id}: Remove a beer (admin role).
#[utoipa::path(
    delete,
    path = "/api/beers/{id}",
    params(("id" = Uuid, Path, description = "Beer ID")),
    responses(
        (status = 200, description = "Beer deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Beer not found", body = crate::error::ErrorBody),
    ),
    tag = "beers"
)]
async fn delete_beer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    state
        .beers
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("beer {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::beers::delete(pool, id)
            .await
            .map_err(|e| persist_failed("beer", id, e))?;
    }

    tracing::info!(beer_id = %id, "beer deleted");
    Ok(Json(MessageResponse::new("Beer deleted")))
}

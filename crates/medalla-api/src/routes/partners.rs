//! # Partner Locator API
//!
//! Bars, shops and distributors that pour or sell the beer. The public map
//! lists active partners and asks for those near the visitor:
//!
//! ```text
//! GET /api/partners/near?lat=-31.42&lng=-62.08&dist=25
//! ```
//!
//! Distances are great-circle kilometres; results come nearest first.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use medalla_core::{GeoPoint, ValidationError};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_list, clean_opt, extract_query, extract_validated_json, Validate};
use crate::state::{AppState, PartnerAddress, PartnerContact, PartnerRecord};

use super::{check_required, persist_failed, MessageResponse};

/// Search radius when `dist` is omitted, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Coordinates as sent by clients; range-checked into a [`GeoPoint`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LocationInput {
    pub lat: f64,
    pub lng: f64,
}

impl LocationInput {
    fn to_point(self) -> Result<GeoPoint, ValidationError> {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Request to add a partner venue.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePartnerRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub partner_type: String,
    pub location: LocationInput,
    #[serde(default)]
    pub location_details: PartnerAddress,
    #[serde(default)]
    pub contact: PartnerContact,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub varieties: Vec<String>,
    #[serde(default)]
    pub is_official: bool,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for CreatePartnerRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.partner_type.trim().is_empty() {
            return Err("type must not be empty".to_string());
        }
        self.location.to_point().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl CreatePartnerRequest {
    pub fn into_record(self, now: DateTime<Utc>) -> Result<PartnerRecord, ValidationError> {
        Ok(PartnerRecord {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            partner_type: self.partner_type.trim().to_string(),
            location: self.location.to_point()?,
            location_details: self.location_details,
            contact: self.contact,
            features: clean_list(self.features),
            varieties: clean_list(self.varieties),
            is_official: self.is_official,
            logo: clean_opt(self.logo),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a partner.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePartnerRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub partner_type: Option<String>,
    pub location: Option<LocationInput>,
    pub location_details: Option<PartnerAddress>,
    pub contact: Option<PartnerContact>,
    pub features: Option<Vec<String>>,
    pub varieties: Option<Vec<String>>,
    pub is_official: Option<bool>,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdatePartnerRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("name", self.name.as_deref())?;
        check_required("type", self.partner_type.as_deref())?;
        if let Some(location) = self.location {
            location.to_point().map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl UpdatePartnerRequest {
    fn apply(self, partner: &mut PartnerRecord, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(location) = self.location {
            partner.location = location.to_point()?;
        }
        if let Some(name) = self.name {
            partner.name = name.trim().to_string();
        }
        if let Some(partner_type) = self.partner_type {
            partner.partner_type = partner_type.trim().to_string();
        }
        if let Some(details) = self.location_details {
            partner.location_details = details;
        }
        if let Some(contact) = self.contact {
            partner.contact = contact;
        }
        if let Some(features) = self.features {
            partner.features = clean_list(features);
        }
        if let Some(varieties) = self.varieties {
            partner.varieties = clean_list(varieties);
        }
        if let Some(official) = self.is_official {
            partner.is_official = official;
        }
        if self.logo.is_some() {
            partner.logo = clean_opt(self.logo);
        }
        if let Some(active) = self.is_active {
            partner.is_active = active;
        }
        partner.updated_at = now;
        Ok(())
    }
}

/// Query of the radius search.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearQuery {
    /// Latitude of the visitor, decimal degrees.
    pub lat: Option<f64>,
    /// Longitude of the visitor, decimal degrees.
    pub lng: Option<f64>,
    /// Radius in kilometres (default 50).
    pub dist: Option<f64>,
}

impl NearQuery {
    fn resolve(&self) -> Result<(GeoPoint, f64), AppError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Err(AppError::BadRequest(
                "lat and lng query parameters are required".to_string(),
            ));
        };
        let origin = GeoPoint::new(lat, lng).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let radius = self.dist.unwrap_or(DEFAULT_RADIUS_KM);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(AppError::BadRequest(
                "dist must be a positive number of kilometres".to_string(),
            ));
        }
        Ok((origin, radius))
    }
}

/// A partner found by the radius search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NearbyPartner {
    #[serde(flatten)]
    pub partner: PartnerRecord,
    /// Great-circle distance from the query point, in kilometres.
    pub distance_km: f64,
}

/// Active partners within `radius_km` of `origin`, nearest first.
pub fn nearby(
    partners: impl IntoIterator<Item = PartnerRecord>,
    origin: &GeoPoint,
    radius_km: f64,
) -> Vec<NearbyPartner> {
    let mut found: Vec<NearbyPartner> = partners
        .into_iter()
        .filter(|p| p.is_active)
        .filter_map(|partner| {
            let distance_km = origin.distance_km(&partner.location);
            (distance_km <= radius_km).then_some(NearbyPartner {
                partner,
                distance_km,
            })
        })
        .collect();
    found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    found
}

/// Build the partners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/partners", get(list_active_partners).post(create_partner))
        .route("/api/partners/near", get(near_partners))
        .route("/api/partners/all", get(list_all_partners))
        .route("/api/partners/{id}", put(update_partner).delete(delete_partner))
}

/// GET /api/partners: Active partners for the public map.
#[utoipa::path(
    get,
    path = "/api/partners",
    responses(
        (status = 200, description = "Active partners", body = Vec<PartnerRecord>),
    ),
    tag = "partners"
)]
async fn list_active_partners(State(state): State<AppState>) -> Json<Vec<PartnerRecord>> {
    let mut partners: Vec<PartnerRecord> =
        state.partners.list().into_iter().filter(|p| p.is_active).collect();
    partners.sort_by(|a, b| a.name.cmp(&b.name));
    Json(partners)
}

/// GET /api/partners/near: Radius search around a point.
#[utoipa::path(
    get,
    path = "/api/partners/near",
    params(NearQuery),
    responses(
        (status = 200, description = "Partners within the radius, nearest first", body = Vec<NearbyPartner>),
        (status = 400, description = "Missing or invalid coordinates", body = crate::error::ErrorBody),
    ),
    tag = "partners"
)]
async fn near_partners(
    State(state): State<AppState>,
    query: Result<Query<NearQuery>, QueryRejection>,
) -> Result<Json<Vec<NearbyPartner>>, AppError> {
    let query = extract_query(query)?;
    let (origin, radius_km) = query.resolve()?;
    let found = nearby(state.partners.list(), &origin, radius_km);
    tracing::debug!(
        lat = origin.lat(),
        lng = origin.lng(),
        radius_km,
        found = found.len(),
        "partner radius search"
    );
    Ok(Json(found))
}

/// GET /api/partners/all: Every partner, active or not.
#[utoipa::path(
    get,
    path = "/api/partners/all",
    responses(
        (status = 200, description = "All partners", body = Vec<PartnerRecord>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
    ),
    tag = "partners"
)]
async fn list_all_partners(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Json<Vec<PartnerRecord>> {
    let mut partners = state.partners.list();
    partners.sort_by(|a, b| a.name.cmp(&b.name));
    Json(partners)
}

/// POST /api/partners: Add a partner.
#[utoipa::path(
    post,
    path = "/api/partners",
    request_body = CreatePartnerRequest,
    responses(
        (status = 201, description = "Partner created", body = PartnerRecord),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "partners"
)]
async fn create_partner(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreatePartnerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PartnerRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let record = req.into_record(Utc::now())?;
    state.partners.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::partners::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("partner", record.id, e))?;
    }

    tracing::info!(partner_id = %record.id, name = %record.name, "partner created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/partners/{id}: Partial update.
#[utoipa::path(
    put,
    path = "/api/partners/{id}",
    params(("id" = Uuid, Path, description = "Partner ID")),
    request_body = UpdatePartnerRequest,
    responses(
        (status = 200, description = "Partner updated", body = PartnerRecord),
        (status = 404, description = "Partner not found", body = crate::error::ErrorBody),
    ),
    tag = "partners"
)]
async fn update_partner(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdatePartnerRequest>, JsonRejection>,
) -> Result<Json<PartnerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();

    let record = state
        .partners
        .try_update(&id, |partner| {
            req.apply(partner, now)?;
            Ok::<_, ValidationError>(partner.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("partner {id} not found")))??;

    if let Some(pool) = &state.db_pool {
        crate::db::partners::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("partner", id, e))?;
    }

    Ok(Json(record))
}

/// DELETE /api/partners/{id}: Remove a partner (admin role).
#[utoipa::path(
    delete,
    path = "/api/partners/{id}",
    params(("id" = Uuid, Path, description = "Partner ID")),
    responses(
        (status = 200, description = "Partner deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Partner not found", body = crate::error::ErrorBody),
    ),
    tag = "partners"
)]
async fn delete_partner(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    state
        .partners
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("partner {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::partners::delete(pool, id)
            .await
            .map_err(|e| persist_failed("partner", id, e))?;
    }

    tracing::info!(partner_id = %id, "partner deleted");
    Ok(Json(MessageResponse::new("Partner deleted")))
}

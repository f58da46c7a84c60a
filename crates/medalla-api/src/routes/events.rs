//! # Events API
//!
//! Tastings, fairs and brewery events. The public list shows active events
//! from now on, soonest first; the admin list shows everything, most
//! recent date first.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use medalla_core::GeoPoint;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_opt, extract_validated_json, Validate};
use crate::state::{AppState, EventLocation, EventRecord};

use super::{check_len, check_required, persist_failed, MessageResponse};

const MAX_TITLE_LEN: usize = 200;

/// Request to publish an event.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default)]
    pub location: EventLocation,
    pub image: Option<String>,
    pub calendar_link: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for CreateEventRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        check_location(&self.location)
    }
}

impl CreateEventRequest {
    pub fn into_record(self, now: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            date: self.date,
            description: clean_opt(self.description),
            location: self.location,
            image: clean_opt(self.image),
            calendar_link: clean_opt(self.calendar_link),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of an event.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<EventLocation>,
    pub image: Option<String>,
    pub calendar_link: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateEventRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("title", self.title.as_deref())?;
        if let Some(title) = &self.title {
            check_len("title", title, MAX_TITLE_LEN)?;
        }
        match &self.location {
            Some(location) => check_location(location),
            None => Ok(()),
        }
    }
}

impl UpdateEventRequest {
    fn apply(self, event: &mut EventRecord, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            event.title = title.trim().to_string();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if self.description.is_some() {
            event.description = clean_opt(self.description);
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if self.image.is_some() {
            event.image = clean_opt(self.image);
        }
        if self.calendar_link.is_some() {
            event.calendar_link = clean_opt(self.calendar_link);
        }
        if let Some(active) = self.is_active {
            event.is_active = active;
        }
        event.updated_at = now;
    }
}

/// Coordinates are optional, but must come as a valid pair.
fn check_location(location: &EventLocation) -> Result<(), String> {
    match (location.lat, location.lng) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(|_| ()).map_err(|e| e.to_string()),
        _ => Err("location.lat and location.lng must be given together".to_string()),
    }
}

/// Active events on or after `now`, soonest first.
pub fn upcoming(events: impl IntoIterator<Item = EventRecord>, now: DateTime<Utc>) -> Vec<EventRecord> {
    let mut events: Vec<EventRecord> = events
        .into_iter()
        .filter(|e| e.is_active && e.date >= now)
        .collect();
    events.sort_by_key(|e| e.date);
    events
}

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_upcoming_events).post(create_event))
        .route("/api/events/all", get(list_all_events))
        .route("/api/events/{id}", put(update_event).delete(delete_event))
}

/// GET /api/events: Upcoming active events.
#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Upcoming events, soonest first", body = Vec<EventRecord>),
    ),
    tag = "events"
)]
async fn list_upcoming_events(State(state): State<AppState>) -> Json<Vec<EventRecord>> {
    Json(upcoming(state.events.list(), Utc::now()))
}

/// GET /api/events/all: Every event, most recent date first.
#[utoipa::path(
    get,
    path = "/api/events/all",
    responses(
        (status = 200, description = "All events", body = Vec<EventRecord>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn list_all_events(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Json<Vec<EventRecord>> {
    let mut events = state.events.list();
    events.sort_by(|a, b| b.date.cmp(&a.date));
    Json(events)
}

/// POST /api/events: Publish an event.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventRecord),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn create_event(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let record = req.into_record(Utc::now());
    state.events.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::events::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("event", record.id, e))?;
    }

    tracing::info!(event_id = %record.id, date = %record.date, "event created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/events/{id}: Partial update.
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventRecord),
        (status = 404, description = "Event not found", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn update_event(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<EventRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();
    let record = state
        .events
        .update(&id, |event| req.apply(event, now))
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::events::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("event", id, e))?;
    }

    Ok(Json(record))
}

/// DELETE /api/events/{id}: Remove an event (admin role).
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Event not found", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn delete_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    state
        .events
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::events::delete(pool, id)
            .await
            .map_err(|e| persist_failed("event", id, e))?;
    }

    tracing::info!(event_id = %id, "event deleted");
    Ok(Json(MessageResponse::new("Event deleted")))
}

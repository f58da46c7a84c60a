//! # API Route Modules
//!
//! - `beers`: public beer catalog, admin CRUD.
//! - `kegs`: keg sizes and stock, public list of active kegs.
//! - `partners`: partner venues and the radius search used by the locator map.
//! - `events`: upcoming events, admin CRUD.
//! - `customers`: CRM view over rentals (admin only).
//! - `rentals`: keg rental workflow and its stock bookkeeping (admin only).
//!
//! Every mutation updates the in-memory store first and then writes the
//! record through to Postgres when a pool is configured. A failed write is
//! surfaced as a 500 since the record would not survive a restart.

pub mod beers;
pub mod customers;
pub mod events;
pub mod kegs;
pub mod partners;
pub mod rentals;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Plain acknowledgement body, e.g. `{"message": "Keg deleted"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Log a failed write-through and turn it into a 500.
pub(crate) fn persist_failed(entity: &'static str, id: Uuid, err: sqlx::Error) -> AppError {
    tracing::error!(entity, id = %id, error = %err, "failed to persist to database");
    AppError::Internal(format!(
        "{entity} {id} recorded in-memory but database persist failed"
    ))
}

/// Reject a blank optional update of a required text field.
pub(crate) fn check_required(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("{field} must not be empty")),
        _ => Ok(()),
    }
}

/// Reject text longer than `max` characters.
pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        Err(format!("{field} must not exceed {max} characters"))
    } else {
        Ok(())
    }
}

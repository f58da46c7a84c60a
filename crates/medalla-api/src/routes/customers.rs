//! # Customer API
//!
//! A light CRM over the rental log. Customers are keyed by phone. Creating a
//! rental with a phone in `contact` records the customer automatically; the
//! listing recomputes every customer's activity from the rentals themselves.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use medalla_core::PhoneNumber;
use medalla_state::{belongs_to, latest, CustomerActivity};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{clean_opt, extract_validated_json, Validate};
use crate::state::{AppState, CustomerRecord, RentalRecord};

use super::rentals::{populate_sorted, RentalDetail};
use super::{check_len, check_required, persist_failed, MessageResponse};

const MAX_NAME_LEN: usize = 200;

/// Request to register a customer by hand.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl Validate for CreateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        check_len("name", &self.name, MAX_NAME_LEN)?;
        PhoneNumber::parse(&self.phone).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Partial update of a customer.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl Validate for UpdateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("name", self.name.as_deref())?;
        if let Some(name) = &self.name {
            check_len("name", name, MAX_NAME_LEN)?;
        }
        if let Some(phone) = &self.phone {
            PhoneNumber::parse(phone).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// A customer with activity recomputed from the rental log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: CustomerRecord,
    /// Sum of the amounts of every matching rental.
    pub total_spent: f64,
}

impl CustomerSummary {
    pub fn from_rentals(mut customer: CustomerRecord, rentals: &[RentalRecord]) -> Self {
        let activity = CustomerActivity::collect(&customer.phone, &customer.name, rentals);
        customer.total_rentals = activity.total_rentals;
        customer.last_rental_date = activity.last_rental_date;
        Self {
            customer,
            total_spent: activity.total_spent,
        }
    }
}

/// Record a new rental against its customer, creating the customer if needed.
///
/// Only rentals whose `contact` parses as a phone number are linked. Errors
/// are logged and swallowed: the rental has already been accepted.
pub(crate) async fn record_rental(state: &AppState, rental: &RentalRecord) -> Option<CustomerRecord> {
    let contact = rental.contact.as_deref()?;
    let phone = match PhoneNumber::parse(contact) {
        Ok(phone) => phone,
        Err(e) => {
            tracing::debug!(rental_id = %rental.id, error = %e, "rental contact is not a phone; customer not linked");
            return None;
        }
    };

    let now = Utc::now();
    let customer = state.customers.with_write(|customers| {
        match customers.values_mut().find(|c| c.phone == phone.as_str()) {
            Some(existing) => {
                existing.name = rental.customer_name.clone();
                existing.total_rentals += 1;
                existing.last_rental_date = Some(latest(existing.last_rental_date, now));
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let record = CustomerRecord {
                    id: Uuid::new_v4(),
                    name: rental.customer_name.clone(),
                    phone: phone.as_str().to_string(),
                    email: None,
                    address: None,
                    total_rentals: 1,
                    last_rental_date: Some(now),
                    notes: None,
                    created_at: now,
                    updated_at: now,
                };
                customers.insert(record.id, record.clone());
                record
            }
        }
    });

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::customers::upsert(pool, &customer).await {
            tracing::error!(
                customer_id = %customer.id,
                rental_id = %rental.id,
                error = %e,
                "failed to persist customer for rental; rental kept"
            );
        }
    }

    tracing::debug!(customer_id = %customer.id, total_rentals = customer.total_rentals, "customer recorded rental");
    Some(customer)
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route("/api/customers/{id}", put(update_customer).delete(delete_customer))
        .route("/api/customers/{id}/history", get(customer_history))
}

/// GET /api/customers: Customers with recomputed activity.
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "Customers, most recently updated first", body = Vec<CustomerSummary>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
async fn list_customers(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Json<Vec<CustomerSummary>> {
    let rentals = state.rentals.list();
    let mut customers = state.customers.list();
    customers.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Json(
        customers
            .into_iter()
            .map(|c| CustomerSummary::from_rentals(c, &rentals))
            .collect(),
    )
}

/// POST /api/customers: Register a customer.
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerRecord),
        (status = 409, description = "Phone already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
async fn create_customer(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    body: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let phone = PhoneNumber::parse(&req.phone)?;
    let now = Utc::now();

    let record = state.customers.with_write(|customers| {
        if customers.values().any(|c| c.phone == phone.as_str()) {
            return Err(AppError::Conflict(format!(
                "a customer with phone {phone} already exists"
            )));
        }
        let record = CustomerRecord {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            phone: phone.as_str().to_string(),
            email: clean_opt(req.email),
            address: clean_opt(req.address),
            total_rentals: 0,
            last_rental_date: None,
            notes: clean_opt(req.notes),
            created_at: now,
            updated_at: now,
        };
        customers.insert(record.id, record.clone());
        Ok(record)
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("customer", record.id, e))?;
    }

    tracing::info!(customer_id = %record.id, "customer created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/customers/{id}: Partial update.
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerRecord),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
        (status = 409, description = "Phone belongs to another customer", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
async fn update_customer(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let phone = req.phone.as_deref().map(PhoneNumber::parse).transpose()?;
    let now = Utc::now();

    let record = state.customers.with_write(|customers| {
        if let Some(phone) = &phone {
            if customers
                .values()
                .any(|c| c.id != id && c.phone == phone.as_str())
            {
                return Err(AppError::Conflict(format!(
                    "phone {phone} belongs to another customer"
                )));
            }
        }
        let customer = customers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;
        if let Some(name) = req.name {
            customer.name = name.trim().to_string();
        }
        if let Some(phone) = phone {
            customer.phone = phone.into_inner();
        }
        if req.email.is_some() {
            customer.email = clean_opt(req.email);
        }
        if req.address.is_some() {
            customer.address = clean_opt(req.address);
        }
        if req.notes.is_some() {
            customer.notes = clean_opt(req.notes);
        }
        customer.updated_at = now;
        Ok(customer.clone())
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("customer", id, e))?;
    }

    Ok(Json(record))
}

/// GET /api/customers/{id}/history: The customer's rentals, populated.
#[utoipa::path(
    get,
    path = "/api/customers/{id}/history",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Matching rentals, most recent pickup first", body = Vec<RentalDetail>),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
async fn customer_history(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RentalDetail>>, AppError> {
    let customer = state
        .customers
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;
    let rentals: Vec<RentalRecord> = state
        .rentals
        .list()
        .into_iter()
        .filter(|r| belongs_to(r, &customer.phone, &customer.name))
        .collect();
    Ok(Json(populate_sorted(&state, rentals)))
}

/// DELETE /api/customers/{id}: Remove a customer (admin role). Rentals stay.
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 404, description = "Customer not found", body = crate::error::ErrorBody),
    ),
    tag = "customers"
)]
async fn delete_customer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    state
        .customers
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::customers::delete(pool, id)
            .await
            .map_err(|e| persist_failed("customer", id, e))?;
    }

    tracing::info!(customer_id = %id, "customer deleted");
    Ok(Json(MessageResponse::new("Customer deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RentalItem;
    use chrono::{DateTime, Duration, TimeZone};
    use medalla_core::{PaymentMethod, RentalStatus};

    fn customer(name: &str, phone: &str) -> CustomerRecord {
        let now = Utc::now();
        CustomerRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            address: None,
            total_rentals: 99,
            last_rental_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn rental(name: &str, contact: Option<&str>, amount: Option<f64>, created_at: DateTime<Utc>) -> RentalRecord {
        RentalRecord {
            id: Uuid::new_v4(),
            pickup_date: None,
            return_date: None,
            customer_name: name.to_string(),
            contact: contact.map(str::to_string),
            items: vec![RentalItem {
                keg_id: Uuid::new_v4(),
                beer_id: None,
                quantity: 1,
                barrel_ids: vec![],
            }],
            amount,
            is_paid: false,
            payment_method: PaymentMethod::Efectivo,
            notes: None,
            status: RentalStatus::Reservado,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn summary_counts_phone_or_name_matches() {
        let d1 = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let d2 = d1 + Duration::days(10);
        let rentals = vec![
            rental("Juan", Some("3564 123456"), Some(15000.0), d1),
            rental("Juan Pérez", None, Some(5000.0), d2),
            rental("Otro", Some("3564 999999"), Some(1.0), d2),
            rental("Otro", Some("3564 123456"), None, d1),
        ];
        let summary = CustomerSummary::from_rentals(customer("Juan Pérez", "3564 123456"), &rentals);
        assert_eq!(summary.customer.total_rentals, 3);
        assert_eq!(summary.total_spent, 20000.0);
        assert_eq!(summary.customer.last_rental_date, Some(d2));
    }

    #[test]
    fn summary_without_rentals_is_zero() {
        let summary = CustomerSummary::from_rentals(customer("Nadie", "3564 000000"), &[]);
        assert_eq!(summary.customer.total_rentals, 0);
        assert_eq!(summary.total_spent, 0.0);
        assert!(summary.customer.last_rental_date.is_none());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "Nadie");
        assert_eq!(json["total_spent"], 0.0);
    }

    #[tokio::test]
    async fn record_rental_inserts_then_increments() {
        let state = AppState::new();
        let first = rental("Ana", Some(" +54 3564 111 "), None, Utc::now());
        let created = record_rental(&state, &first).await.unwrap();
        assert_eq!(created.total_rentals, 1);
        assert_eq!(created.phone, "+54 3564 111");

        let second = rental("Ana María", Some("+54 3564 111"), None, Utc::now());
        let updated = record_rental(&state, &second).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.total_rentals, 2);
        assert_eq!(updated.name, "Ana María");
        assert_eq!(state.customers.len(), 1);
    }

    #[tokio::test]
    async fn record_rental_ignores_non_phone_contact() {
        let state = AppState::new();
        assert!(record_rental(&state, &rental("Ana", None, None, Utc::now())).await.is_none());
        assert!(record_rental(&state, &rental("Ana", Some("ana@example.com"), None, Utc::now()))
            .await
            .is_none());
        assert!(state.customers.is_empty());
    }

    #[test]
    fn create_requires_valid_phone() {
        let req: CreateCustomerRequest =
            serde_json::from_str(r#"{"name": "Ana", "phone": "llamar"}"#).unwrap();
        assert!(req.validate().unwrap_err().contains("phone"));
    }
}

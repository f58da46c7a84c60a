//! # OpenAPI Document
//!
//! Assembled at compile time by `utoipa` from the `#[utoipa::path]`
//! annotations on every handler and the `ToSchema` derives on the records
//! and request types. Served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Medalla API",
        version = "0.1.0",
        description = "Beer catalog, partner locator, events and keg rental back office of the Medalla brewery.",
        license(name = "MIT")
    ),
    paths(
        // Beers
        crate::routes::beers::list_beers,
        crate::routes::beers::get_beer,
        crate::routes::beers::create_beer,
        crate::routes::beers::update_beer,
        crate::routes::beers::delete_beer,
        // Kegs
        crate::routes::kegs::list_active_kegs,
        crate::routes::kegs::list_all_kegs,
        crate::routes::kegs::create_keg,
        crate::routes::kegs::update_keg,
        crate::routes::kegs::delete_keg,
        // Partners
        crate::routes::partners::list_active_partners,
        crate::routes::partners::near_partners,
        crate::routes::partners::list_all_partners,
        crate::routes::partners::create_partner,
        crate::routes::partners::update_partner,
        crate::routes::partners::delete_partner,
        // Events
        crate::routes::events::list_upcoming_events,
        crate::routes::events::list_all_events,
        crate::routes::events::create_event,
        crate::routes::events::update_event,
        crate::routes::events::delete_event,
        // Customers
        crate::routes::customers::list_customers,
        crate::routes::customers::create_customer,
        crate::routes::customers::update_customer,
        crate::routes::customers::customer_history,
        crate::routes::customers::delete_customer,
        // Rentals
        crate::routes::rentals::list_rentals,
        crate::routes::rentals::create_rental,
        crate::routes::rentals::update_rental,
        crate::routes::rentals::delete_rental,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::MessageResponse,
        // Records
        crate::state::BeerRecord,
        crate::state::BeerSpecs,
        crate::state::BeerImages,
        crate::state::KegRecord,
        crate::state::PartnerRecord,
        crate::state::PartnerAddress,
        crate::state::PartnerContact,
        crate::state::EventRecord,
        crate::state::EventLocation,
        crate::state::CustomerRecord,
        crate::state::RentalItem,
        crate::state::RentalRecord,
        // Request / response DTOs
        crate::routes::beers::CreateBeerRequest,
        crate::routes::beers::UpdateBeerRequest,
        crate::routes::kegs::CreateKegRequest,
        crate::routes::kegs::UpdateKegRequest,
        crate::routes::partners::LocationInput,
        crate::routes::partners::CreatePartnerRequest,
        crate::routes::partners::UpdatePartnerRequest,
        crate::routes::partners::NearbyPartner,
        crate::routes::events::CreateEventRequest,
        crate::routes::events::UpdateEventRequest,
        crate::routes::customers::CreateCustomerRequest,
        crate::routes::customers::UpdateCustomerRequest,
        crate::routes::customers::CustomerSummary,
        crate::routes::rentals::CreateRentalRequest,
        crate::routes::rentals::UpdateRentalRequest,
        crate::routes::rentals::RentalDetail,
        crate::routes::rentals::RentalItemDetail,
        crate::routes::rentals::KegRef,
        crate::routes::rentals::BeerRef,
    )),
    tags(
        (name = "beers", description = "Beer catalog"),
        (name = "kegs", description = "Keg sizes and stock"),
        (name = "partners", description = "Partner locator"),
        (name = "events", description = "Brewery events"),
        (name = "customers", description = "Customer CRM"),
        (name = "rentals", description = "Keg rentals"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

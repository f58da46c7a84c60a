//! # medalla-core: Foundational Types for the Medalla Back Office
//!
//! Domain primitives shared by every other crate in the workspace. The
//! bookkeeping crate (`medalla-state`) and the HTTP service (`medalla-api`)
//! both build on these types; this crate depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated constructors for domain primitives.** A `GeoPoint` always
//!    holds coordinates inside the WGS84 ranges and a `PhoneNumber` is never
//!    blank. Invalid input is rejected with a `ValidationError` at the edge.
//!
//! 2. **Closed enums for workflow vocabulary.** `RentalStatus` and
//!    `PaymentMethod` serialize to the exact Spanish labels the back office
//!    shows, and exhaustive `match` forces every consumer to handle each one.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `medalla-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod geo;
pub mod phone;
pub mod rental;

pub use error::{require_text, ValidationError};
pub use geo::{GeoPoint, EARTH_RADIUS_KM};
pub use phone::PhoneNumber;
pub use rental::{PaymentMethod, RentalStatus};

//! # medalla-state: Rental Bookkeeping
//!
//! The pure, storage-agnostic rules behind the keg rental workflow. Nothing
//! here touches the network or a database; the API crate holds the locks and
//! persists the results.
//!
//! ## Modules
//!
//! - **Rental** (`rental.rs`): status lifecycle
//!   `Reservado → Retirado → Devuelto` (and reverts). Every status change is
//!   planned into a [`StatusChange`] that states its stock effect and what
//!   happens to the return date.
//!
//! - **Stock** (`stock.rs`): reservation of keg stock for a rental order,
//!   all-or-nothing across every line, plus the release and status-change
//!   movements used when a rental is rolled back or enters or leaves
//!   `Devuelto`. Counts are kept within `±MAX_STOCK`.
//!
//! - **Customer** (`customer.rs`): matching rentals to customers by phone or
//!   name and aggregating their activity.

pub mod customer;
pub mod rental;
pub mod stock;

// ─── Rental re-exports ──────────────────────────────────────────────

pub use rental::{
    check_initial_status, validate_lines, RentalError, ReturnDateRule, StatusChange, StockEffect,
};

// ─── Stock re-exports ───────────────────────────────────────────────

pub use stock::{
    apply_effect, demand, release, reserve, StockAdjustment, StockError, StockHolder, StockLine,
    StockMovement, MAX_STOCK,
};

// ─── Customer re-exports ────────────────────────────────────────────

pub use customer::{belongs_to, latest, CustomerActivity, RentalFootprint};

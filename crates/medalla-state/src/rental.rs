//! # Rental Status Lifecycle
//!
//! A rental takes kegs out of stock when it is created. From then on its
//! status drives the stock count:
//!
//! ```text
//!   Reservado ◀──▶ Retirado          (no stock effect)
//!       │              │
//!       └──────┬───────┘
//!              ▼  return: stock += quantity, return date stamped
//!           Devuelto
//!              │  revert: stock -= quantity, return date cleared
//!              ▼
//!   Reservado / Retirado
//! ```
//!
//! Every pair of statuses is a legal transition. What differs is the stock
//! effect, so a transition is planned into a [`StatusChange`] rather than
//! accepted or rejected.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use medalla_core::RentalStatus;

// ─── Errors ─────────────────────────────────────────────────────────

/// A rental order was rejected before touching stock.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RentalError {
    /// The order has no items.
    #[error("a rental must include at least one keg")]
    EmptyOrder,

    /// An item asked for zero kegs.
    #[error("item {line}: quantity must be at least 1")]
    ZeroQuantity { line: usize },

    /// An item listed barrel serials that do not match its quantity.
    #[error("item {line}: {barrels} barrel ids given for quantity {quantity}")]
    BarrelCountMismatch {
        line: usize,
        quantity: u32,
        barrels: usize,
    },

    /// A rental cannot start out as already returned.
    #[error("a new rental cannot start in status {0}")]
    InvalidInitialStatus(RentalStatus),
}

/// Validate the `(quantity, barrel id count)` of every order line.
///
/// Barrel serials are optional, but when given there must be exactly one per
/// keg. Line numbers in errors are 1-based.
pub fn validate_lines<I>(lines: I) -> Result<(), RentalError>
where
    I: IntoIterator<Item = (u32, usize)>,
{
    let mut seen = 0usize;
    for (idx, (quantity, barrels)) in lines.into_iter().enumerate() {
        seen += 1;
        let line = idx + 1;
        if quantity == 0 {
            return Err(RentalError::ZeroQuantity { line });
        }
        if barrels != 0 && barrels != quantity as usize {
            return Err(RentalError::BarrelCountMismatch {
                line,
                quantity,
                barrels,
            });
        }
    }
    if seen == 0 {
        return Err(RentalError::EmptyOrder);
    }
    Ok(())
}

/// Stock is taken at creation, so a new rental must be holding it.
pub fn check_initial_status(status: RentalStatus) -> Result<(), RentalError> {
    if status.holds_stock() {
        Ok(())
    } else {
        Err(RentalError::InvalidInitialStatus(status))
    }
}

// ─── Transitions ────────────────────────────────────────────────────

/// What a status change does to keg stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockEffect {
    None,
    /// Kegs came back: add every item's quantity to its keg.
    Restore,
    /// A return was reverted: subtract every item's quantity again.
    Withdraw,
}

impl StockEffect {
    /// Multiplier applied to each item quantity.
    pub fn sign(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Restore => 1,
            Self::Withdraw => -1,
        }
    }
}

/// What a status change does to the rental's return date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnDateRule {
    /// Take the requested date if any, else leave it alone.
    Keep,
    /// Take the requested date if any, else now.
    Stamp,
    /// Clear it regardless of the request.
    Clear,
}

/// A planned status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub from: RentalStatus,
    pub to: RentalStatus,
    pub stock: StockEffect,
    pub return_date: ReturnDateRule,
}

impl StatusChange {
    pub fn plan(from: RentalStatus, to: RentalStatus) -> Self {
        let (stock, return_date) = match (from.holds_stock(), to.holds_stock()) {
            (true, false) => (StockEffect::Restore, ReturnDateRule::Stamp),
            (false, true) => (StockEffect::Withdraw, ReturnDateRule::Clear),
            _ => (StockEffect::None, ReturnDateRule::Keep),
        };
        Self {
            from,
            to,
            stock,
            return_date,
        }
    }

    pub fn is_status_change(&self) -> bool {
        self.from != self.to
    }

    /// Resolve the return date after this change.
    pub fn resolve_return_date(
        &self,
        current: Option<DateTime<Utc>>,
        requested: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self.return_date {
            ReturnDateRule::Keep => requested.or(current),
            ReturnDateRule::Stamp => Some(requested.unwrap_or(now)),
            ReturnDateRule::Clear => None,
        }
    }
}

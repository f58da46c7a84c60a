//! # Rental Vocabulary
//!
//! Status and payment labels of a keg rental. Both serialize to the Spanish
//! labels used across the back office and are stored as text columns.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Where a rental stands in its pickup/return cycle.
///
/// ```text
/// Reservado ──► Retirado ──► Devuelto
///     ▲            ▲            │
///     └────────────┴── revert ──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RentalStatus {
    /// Booked; kegs are already set aside from stock.
    #[default]
    Reservado,
    /// Picked up by the customer.
    Retirado,
    /// Returned; kegs are back in stock.
    Devuelto,
}

impl RentalStatus {
    pub const ALL: [RentalStatus; 3] = [Self::Reservado, Self::Retirado, Self::Devuelto];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reservado => "Reservado",
            Self::Retirado => "Retirado",
            Self::Devuelto => "Devuelto",
        }
    }

    /// Whether the rented kegs are out of the warehouse in this status.
    pub fn holds_stock(&self) -> bool {
        !matches!(self, Self::Devuelto)
    }
}

impl std::str::FromStr for RentalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reservado" => Ok(Self::Reservado),
            "Retirado" => Ok(Self::Retirado),
            "Devuelto" => Ok(Self::Devuelto),
            other => Err(ValidationError::UnknownVariant {
                field: "status",
                value: other.to_string(),
                expected: "Reservado, Retirado, Devuelto",
            }),
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rental was (or will be) paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    Efectivo,
    Transferencia,
    Otro,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Efectivo => "Efectivo",
            Self::Transferencia => "Transferencia",
            Self::Otro => "Otro",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Efectivo" => Ok(Self::Efectivo),
            "Transferencia" => Ok(Self::Transferencia),
            "Otro" => Ok(Self::Otro),
            other => Err(ValidationError::UnknownVariant {
                field: "payment_method",
                value: other.to_string(),
                expected: "Efectivo, Transferencia, Otro",
            }),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

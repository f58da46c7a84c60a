//! # Customer Activity
//!
//! Customers are a denormalized view over rentals. A rental belongs to a
//! customer when its contact equals the customer's phone or its customer
//! name equals the customer's name.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The parts of a rental that customer bookkeeping reads.
pub trait RentalFootprint {
    fn contact(&self) -> Option<&str>;
    fn customer_name(&self) -> &str;
    fn amount(&self) -> Option<f64>;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Whether `rental` belongs to the customer with this phone and name.
pub fn belongs_to<R: RentalFootprint + ?Sized>(rental: &R, phone: &str, name: &str) -> bool {
    let phone = phone.trim();
    let name = name.trim();
    let by_phone = !phone.is_empty() && rental.contact().map(str::trim) == Some(phone);
    let by_name = !name.is_empty() && rental.customer_name().trim() == name;
    by_phone || by_name
}

/// Later of an optional date and a new one.
pub fn latest(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    match current {
        Some(existing) if existing > candidate => existing,
        _ => candidate,
    }
}

/// Totals over the rentals that belong to one customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CustomerActivity {
    pub total_rentals: i64,
    pub total_spent: f64,
    pub last_rental_date: Option<DateTime<Utc>>,
}

impl CustomerActivity {
    pub fn record<R: RentalFootprint + ?Sized>(&mut self, rental: &R) {
        self.total_rentals += 1;
        self.total_spent += rental.amount().unwrap_or(0.0);
        self.last_rental_date = Some(latest(self.last_rental_date, rental.created_at()));
    }

    pub fn collect<'a, R, I>(phone: &str, name: &str, rentals: I) -> Self
    where
        R: RentalFootprint + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut activity = Self::default();
        for rental in rentals {
            if belongs_to(rental, phone, name) {
                activity.record(rental);
            }
        }
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Rental {
        contact: Option<&'static str>,
        name: &'static str,
        amount: Option<f64>,
        created_at: DateTime<Utc>,
    }

    impl RentalFootprint for Rental {
        fn contact(&self) -> Option<&str> {
            self.contact
        }
        fn customer_name(&self) -> &str {
            self.name
        }
        fn amount(&self) -> Option<f64> {
            self.amount
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, d, 18, 0, 0).unwrap()
    }

    fn rental(contact: Option<&'static str>, name: &'static str, amount: Option<f64>, d: u32) -> Rental {
        Rental {
            contact,
            name,
            amount,
            created_at: day(d),
        }
    }

    #[test]
    fn matches_by_phone_or_name() {
        let by_phone = rental(Some("3564 111222"), "Bar El Sur", None, 1);
        let by_name = rental(None, "Juan Pérez", None, 1);
        let other = rental(Some("3564 999999"), "Otra Persona", None, 1);
        assert!(belongs_to(&by_phone, "3564 111222", "Juan Pérez"));
        assert!(belongs_to(&by_name, "3564 111222", "Juan Pérez"));
        assert!(!belongs_to(&other, "3564 111222", "Juan Pérez"));
    }

    #[test]
    fn blank_name_matches_nothing() {
        let r = rental(None, "", None, 1);
        assert!(!belongs_to(&r, "3564 111222", "  "));
    }

    #[test]
    fn aggregates_count_spend_and_latest() {
        let rentals = vec![
            rental(Some("3564 111222"), "Juan", Some(45000.0), 3),
            rental(None, "Juan", None, 9),
            rental(Some("3564 111222"), "Juan P.", Some(30000.0), 5),
            rental(Some("11 4444 5555"), "Ana", Some(99999.0), 20),
        ];
        let activity = CustomerActivity::collect("3564 111222", "Juan", &rentals);
        assert_eq!(activity.total_rentals, 3);
        assert_eq!(activity.total_spent, 75000.0);
        assert_eq!(activity.last_rental_date, Some(day(9)));
    }

    #[test]
    fn no_rentals_means_empty_activity() {
        let rentals: Vec<Rental> = Vec::new();
        assert_eq!(
            CustomerActivity::collect("1", "x", &rentals),
            CustomerActivity::default()
        );
    }

    #[test]
    fn latest_keeps_newer_existing_date() {
        assert_eq!(latest(Some(day(10)), day(4)), day(10));
        assert_eq!(latest(Some(day(1)), day(4)), day(4));
        assert_eq!(latest(None, day(4)), day(4));
    }
}

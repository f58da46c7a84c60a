//! # Geographic Points
//!
//! Partner venues are located by a WGS84 point. The public locator asks
//! for every venue within a radius of the visitor, so the only operation
//! needed beyond validation is the great-circle distance between two
//! points.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        check_range("lat", lat, 90.0)?;
        check_range("lng", lng, 180.0)?;
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        // Clamp guards against a > 1 from rounding on antipodal points.
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_RADIUS_KM * c
    }

    /// Whether `other` lies within `radius_km` of this point.
    pub fn within_km(&self, other: &GeoPoint, radius_km: f64) -> bool {
        self.distance_km(other) <= radius_km
    }
}

fn check_range(field: &'static str, value: f64, bound: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < -bound || value > bound {
        return Err(ValidationError::OutOfRange {
            field,
            min: -bound,
            max: bound,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cordoba() -> GeoPoint {
        GeoPoint::new(-31.4201, -64.1888).unwrap()
    }

    fn san_francisco_cba() -> GeoPoint {
        GeoPoint::new(-31.4256, -62.0841).unwrap()
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = GeoPoint::new(90.01, 0.0).unwrap_err();
        assert_eq!(err.field(), "lat");
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(GeoPoint::new(0.0, -180.5).is_err());
    }

    #[test]
    fn rejects_nan() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn accepts_bounds() {
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        assert!((a.distance_km(&b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn cordoba_to_san_francisco() {
        let d = cordoba().distance_km(&san_francisco_cba());
        assert!(d > 195.0 && d < 205.0, "got {d}");
        assert!(!cordoba().within_km(&san_francisco_cba(), 50.0));
        assert!(cordoba().within_km(&san_francisco_cba(), 250.0));
    }

    #[test]
    fn deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": -31.5, "lng": -62.1}"#).unwrap();
        assert_eq!(ok.lat(), -31.5);
        assert!(serde_json::from_str::<GeoPoint>(r#"{"lat": 120.0, "lng": 0.0}"#).is_err());
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_bounded(
            lat1 in -90.0f64..=90.0, lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lng2 in -180.0f64..=180.0,
        ) {
            let a = GeoPoint::new(lat1, lng1).unwrap();
            let b = GeoPoint::new(lat2, lng2).unwrap();
            let ab = a.distance_km(&b);
            let ba = b.distance_km(&a);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}

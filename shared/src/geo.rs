use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Shown in place of a distance when one cannot be computed.
pub const DISTANCE_UNAVAILABLE: &str = "distance unavailable";

/// Raw latitude/longitude pair as reported by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(self) -> Result<ValidatedCoordinate, CoordinateError> {
        ValidatedCoordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCoordinate {
    lat: f64,
    lon: f64,
}

impl ValidatedCoordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        haversine_distance(self, other)
    }
}

impl TryFrom<LatLon> for ValidatedCoordinate {
    type Error = CoordinateError;

    fn try_from(value: LatLon) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lon)
    }
}

impl From<ValidatedCoordinate> for LatLon {
    fn from(coord: ValidatedCoordinate) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
        }
    }
}

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_distance(p1: ValidatedCoordinate, p2: ValidatedCoordinate) -> f64 {
    const EPSILON: f64 = 1e-10;

    if (p1.lat - p2.lat).abs() < EPSILON && (p1.lon - p2.lon).abs() < EPSILON {
        return 0.0;
    }

    let lat1_rad = p1.lat.to_radians();
    let lat2_rad = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lon - p1.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * a.sqrt().asin()
}

/// Formats a distance as kilometers with two decimals, e.g. `"2.00 km"`.
///
/// Returns `None` for NaN, infinite or negative input so callers can decide
/// between dropping the record and showing [`DISTANCE_UNAVAILABLE`].
#[must_use]
pub fn format_km(meters: f64) -> Option<String> {
    if !meters.is_finite() || meters < 0.0 {
        return None;
    }
    Some(format!("{:.2} km", meters / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Point `meters` due north of `origin` along its meridian.
    fn north_of(origin: ValidatedCoordinate, meters: f64) -> ValidatedCoordinate {
        let dlat = (meters / EARTH_RADIUS_M).to_degrees();
        ValidatedCoordinate::new(origin.lat() + dlat, origin.lon()).unwrap()
    }

    #[test]
    fn test_valid_coordinates() {
        assert!(ValidatedCoordinate::new(0.0, 0.0).is_ok());
        assert!(ValidatedCoordinate::new(90.0, 180.0).is_ok());
        assert!(ValidatedCoordinate::new(-90.0, -180.0).is_ok());
        assert!(ValidatedCoordinate::new(37.5665, 126.978).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert_eq!(
            ValidatedCoordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            ValidatedCoordinate::new(0.0, -181.0),
            Err(CoordinateError::LongitudeOutOfRange(-181.0))
        );
        assert_eq!(
            ValidatedCoordinate::new(f64::NAN, 0.0),
            Err(CoordinateError::NonFinite)
        );
        assert_eq!(
            LatLon::new(0.0, f64::INFINITY).validate(),
            Err(CoordinateError::NonFinite)
        );
    }

    #[test]
    fn test_same_point_distance() {
        let p = ValidatedCoordinate::new(37.5, 127.0).unwrap();
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_one_kilometer_formats_as_1_00() {
        let origin = ValidatedCoordinate::new(37.5, 127.0).unwrap();
        let target = north_of(origin, 1000.0);
        assert_eq!(format_km(origin.distance_to(target)).as_deref(), Some("1.00 km"));
    }

    #[test]
    fn test_seoul_busan_distance() {
        let seoul = ValidatedCoordinate::new(37.5665, 126.978).unwrap();
        let busan = ValidatedCoordinate::new(35.1796, 129.0756).unwrap();
        let distance = haversine_distance(seoul, busan);
        assert!((distance - 325_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_antipodal_distance() {
        let p1 = ValidatedCoordinate::new(0.0, 0.0).unwrap();
        let p2 = ValidatedCoordinate::new(0.0, 180.0).unwrap();
        let expected = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((haversine_distance(p1, p2) - expected).abs() < 1000.0);
    }

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(0.0).as_deref(), Some("0.00 km"));
        assert_eq!(format_km(1234.0).as_deref(), Some("1.23 km"));
        assert_eq!(format_km(15_000.0).as_deref(), Some("15.00 km"));
        assert_eq!(format_km(f64::NAN), None);
        assert_eq!(format_km(f64::INFINITY), None);
        assert_eq!(format_km(-1.0), None);
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_finite(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let a = ValidatedCoordinate::new(lat1, lon1).unwrap();
            let b = ValidatedCoordinate::new(lat2, lon2).unwrap();
            let ab = haversine_distance(a, b);
            let ba = haversine_distance(b, a);
            prop_assert!(ab.is_finite());
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
        }

        #[test]
        fn meridian_offsets_round_trip(meters in 0.0f64..50_000.0) {
            let origin = ValidatedCoordinate::new(37.5, 127.0).unwrap();
            let target = north_of(origin, meters);
            prop_assert!((origin.distance_to(target) - meters).abs() < 0.05);
        }
    }
}

//! Geocoded location types.

use serde::{Deserialize, Serialize};

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert to a geo coordinate (x = longitude, y = latitude)
    pub fn to_coord(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Result of resolving a free-text address.
///
/// `place_id` and `formatted_address` are provider metadata passed through
/// to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

impl GeocodeResult {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

//! Request and response bodies for the address check endpoint.

use serde::{Deserialize, Serialize};

use super::GeocodeResult;

/// Inbound body of `POST /check-address`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRequest {
    /// Free-text street address (required, non-empty)
    #[serde(default)]
    pub address: Option<String>,

    /// Municipality key to test against; unknown keys are ignored
    #[serde(default)]
    pub city: Option<String>,
}

/// Outbound body of `POST /check-address`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub geocode: GeocodeResult,

    /// Recognized city key from the request, or null
    pub requested_city: Option<String>,

    /// First municipality in priority order that contains the point
    pub detected_city: Option<String>,

    /// Containment in the requested city; null when none was requested
    pub inside_selected: Option<bool>,

    pub inside_any_city: bool,

    pub message: String,
}

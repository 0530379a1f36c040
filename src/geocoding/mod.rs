//! Address geocoding.

mod google;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::GeocodeResult;

pub use google::{GoogleGeocoder, DEFAULT_BASE_URL};

/// Why an address could not be resolved
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The request URL is stripped since it carries the API key
    #[error("geocoding request failed: {0}")]
    Transport(reqwest::Error),

    #[error("geocoding provider returned {status}: {message}")]
    Status { status: String, message: String },

    #[error("no results for address")]
    NoResults,

    #[error("could not decode geocoding response: {0}")]
    Decode(String),

    /// Failure outside the provider contract (not a soft geocoding miss)
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::Transport(e.without_url())
    }
}

impl GeocodeError {
    /// Whether this is an ordinary "could not geocode" outcome
    pub fn is_soft(&self) -> bool {
        !matches!(self, GeocodeError::Unexpected(_))
    }
}

/// Resolves a free-text address to a coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;
}

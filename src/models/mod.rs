//! Core data models for the address check service.

pub mod check;
pub mod geocode;

pub use check::{CheckRequest, CheckResponse};
pub use geocode::{GeoPoint, GeocodeResult};

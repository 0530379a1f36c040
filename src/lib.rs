//! Citybound - checks whether a street address falls inside known municipal boundaries.
//!
//! This library provides the boundary loader, the point-in-polygon evaluator,
//! the geocoding client and the HTTP API used by the `server` binary.

pub mod api;
pub mod config;
pub mod geocoding;
pub mod models;
pub mod pip;

pub use models::{CheckRequest, CheckResponse, GeoPoint, GeocodeResult};

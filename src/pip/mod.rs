//! Point-in-Polygon (PIP) municipality lookup.
//!
//! Loads municipality boundaries from GeoJSON once at startup and answers
//! containment queries against them in a fixed priority order.

mod boundary;
mod geometry;
mod index;
mod service;

pub use boundary::{contains, BoundaryFeature, BoundaryGeometry};
pub use geometry::{load_boundary, load_boundary_file, BoundaryError};
pub use index::MunicipalityIndex;
pub use service::{Containment, Evaluation, PipService};

//! PIP service evaluating a point against every known municipality.

use std::sync::Arc;
use tracing::debug;

use super::{BoundaryFeature, MunicipalityIndex};
use crate::models::GeoPoint;

/// Containment result for one municipality
#[derive(Debug, Clone)]
pub struct Containment {
    pub boundary: Arc<BoundaryFeature>,
    pub inside: bool,
}

/// Per-municipality containment results for a single point, in priority order
#[derive(Debug, Clone)]
pub struct Evaluation {
    results: Vec<Containment>,
}

impl Evaluation {
    /// First municipality (in priority order) containing the point
    pub fn detected(&self) -> Option<&Arc<BoundaryFeature>> {
        self.results
            .iter()
            .find(|c| c.inside)
            .map(|c| &c.boundary)
    }

    /// Cached result for a municipality key, if it was evaluated
    pub fn inside(&self, key: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|c| c.boundary.key == key)
            .map(|c| c.inside)
    }

    pub fn inside_any(&self) -> bool {
        self.results.iter().any(|c| c.inside)
    }
}

/// Point-in-Polygon evaluation service
pub struct PipService {
    index: MunicipalityIndex,
}

impl PipService {
    /// Create a new PIP service from a municipality index
    pub fn new(index: MunicipalityIndex) -> Self {
        Self { index }
    }

    /// Test the point against every municipality exactly once
    pub fn evaluate(&self, point: GeoPoint) -> Evaluation {
        let results: Vec<Containment> = self
            .index
            .boundaries()
            .map(|boundary| Containment {
                boundary: Arc::clone(boundary),
                inside: boundary.contains(point),
            })
            .collect();

        debug!(
            "PIP evaluation at ({}, {}): inside {:?}",
            point.lat,
            point.lng,
            results
                .iter()
                .filter(|c| c.inside)
                .map(|c| c.boundary.key.as_str())
                .collect::<Vec<_>>()
        );

        Evaluation { results }
    }

    /// Get the municipality index
    pub fn index(&self) -> &MunicipalityIndex {
        &self.index
    }
}

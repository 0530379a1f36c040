//! Ordered registry of municipality boundaries.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use super::BoundaryFeature;

/// Municipalities in priority (registration) order.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug)]
pub struct MunicipalityIndex {
    boundaries: Vec<Arc<BoundaryFeature>>,
    /// Normalized key -> position in `boundaries`
    by_key: HashMap<String, usize>,
}

/// Normalize a municipality key for lookup
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl MunicipalityIndex {
    /// Build the index, keeping the given order as priority order
    pub fn build(boundaries: Vec<BoundaryFeature>) -> Result<Self> {
        if boundaries.is_empty() {
            bail!("At least one municipality boundary is required");
        }

        let mut by_key = HashMap::with_capacity(boundaries.len());
        for (i, boundary) in boundaries.iter().enumerate() {
            let key = normalize_key(&boundary.key);
            if key.is_empty() {
                bail!("Municipality '{}' has an empty key", boundary.name);
            }
            if by_key.insert(key, i).is_some() {
                bail!("Duplicate municipality key '{}'", boundary.key);
            }
        }

        info!("Municipality index built with {} entries", boundaries.len());
        for (priority, boundary) in boundaries.iter().enumerate() {
            info!(
                "  #{} {} ({}): {} with {} polygons, bbox {:?}",
                priority + 1,
                boundary.name,
                boundary.key,
                boundary.geometry.kind(),
                boundary.geometry.polygon_count(),
                boundary.bbox()
            );
        }

        Ok(Self {
            boundaries: boundaries.into_iter().map(Arc::new).collect(),
            by_key,
        })
    }

    /// Resolve a requested key to its boundary
    pub fn get(&self, key: &str) -> Option<&Arc<BoundaryFeature>> {
        self.by_key
            .get(&normalize_key(key))
            .map(|&i| &self.boundaries[i])
    }

    /// Iterate over all boundaries in priority order
    pub fn boundaries(&self) -> impl Iterator<Item = &Arc<BoundaryFeature>> {
        self.boundaries.iter()
    }

    /// Get total number of registered boundaries
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

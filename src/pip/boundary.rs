//! Municipality boundary features and the containment test.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, MultiPolygon, Polygon, Rect};
use serde_json::{Map, Value};

use crate::models::GeoPoint;

/// Geometry of a municipality.
///
/// Only polygons and multipolygons take part in containment; any other
/// GeoJSON kind is kept as `Unsupported` and never contains a point.
#[derive(Debug, Clone)]
pub enum BoundaryGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Unsupported { kind: String },
}

impl BoundaryGeometry {
    /// GeoJSON type name of this geometry
    pub fn kind(&self) -> &str {
        match self {
            BoundaryGeometry::Polygon(_) => "Polygon",
            BoundaryGeometry::MultiPolygon(_) => "MultiPolygon",
            BoundaryGeometry::Unsupported { kind } => kind,
        }
    }

    /// Number of polygon parts
    pub fn polygon_count(&self) -> usize {
        match self {
            BoundaryGeometry::Polygon(_) => 1,
            BoundaryGeometry::MultiPolygon(mp) => mp.0.len(),
            BoundaryGeometry::Unsupported { .. } => 0,
        }
    }

    fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            BoundaryGeometry::Polygon(p) => p.bounding_rect(),
            BoundaryGeometry::MultiPolygon(mp) => mp.bounding_rect(),
            BoundaryGeometry::Unsupported { .. } => None,
        }
    }
}

/// A named municipality boundary, immutable once loaded
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// Human-readable name, e.g. "Homestead"
    pub name: String,

    /// Stable identifier used in requests and responses, e.g. "homestead"
    pub key: String,

    pub geometry: BoundaryGeometry,

    /// Properties of the source feature (empty for bare geometries)
    pub properties: Map<String, Value>,

    bbox: Option<Rect<f64>>,
}

impl BoundaryFeature {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        geometry: BoundaryGeometry,
        properties: Map<String, Value>,
    ) -> Self {
        let bbox = geometry.bounding_rect();
        Self {
            name: name.into(),
            key: key.into(),
            geometry,
            properties,
            bbox,
        }
    }

    /// Get the bounding box of this boundary as (min_lng, min_lat, max_lng, max_lat)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.bbox
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Whether `point` lies inside this boundary.
    ///
    /// Points on a ring (outer edge or hole edge) count as inside. Points
    /// strictly inside a hole are outside.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let coord = point.to_coord();

        if let Some(rect) = &self.bbox {
            let (min, max) = (rect.min(), rect.max());
            if coord.x < min.x || coord.x > max.x || coord.y < min.y || coord.y > max.y {
                return false;
            }
        }

        let position = match &self.geometry {
            BoundaryGeometry::Polygon(p) => p.coordinate_position(&coord),
            BoundaryGeometry::MultiPolygon(mp) => mp.coordinate_position(&coord),
            BoundaryGeometry::Unsupported { .. } => return false,
        };

        matches!(position, CoordPos::Inside | CoordPos::OnBoundary)
    }
}

/// Free-function form of [`BoundaryFeature::contains`]
pub fn contains(point: GeoPoint, feature: &BoundaryFeature) -> bool {
    feature.contains(point)
}

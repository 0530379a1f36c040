//! Boundary loading from GeoJSON.
//!
//! A boundary file may hold a `FeatureCollection`, a single `Feature`, or a
//! bare geometry. All three are resolved here, once, into a single
//! [`BoundaryFeature`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::{BoundaryFeature, BoundaryGeometry};

/// Errors raised while normalizing a boundary source
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("boundary source is not a GeoJSON object")]
    NotAnObject,

    #[error("boundary source has no \"type\" member")]
    MissingType,

    #[error("feature collection contains no features")]
    EmptyCollection,

    #[error("malformed {kind}: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("position must have at least two ordinates, found {0}")]
    ShortPosition(usize),

    #[error("polygon has no rings")]
    EmptyPolygon,
}

/// GeoJSON position: [lng, lat, (altitude)]
type Position = Vec<f64>;
type Ring = Vec<Position>;

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawPolygon {
    coordinates: Vec<Ring>,
}

#[derive(Debug, Deserialize)]
struct RawMultiPolygon {
    coordinates: Vec<Vec<Ring>>,
}

/// The three accepted top-level shapes of a boundary source
#[derive(Debug)]
enum BoundarySource {
    Feature(RawFeature),
    FeatureCollection(RawFeatureCollection),
    Geometry(Value),
}

impl BoundarySource {
    fn parse(value: Value) -> Result<Self, BoundaryError> {
        let kind = value
            .as_object()
            .ok_or(BoundaryError::NotAnObject)?
            .get("type")
            .and_then(Value::as_str)
            .ok_or(BoundaryError::MissingType)?
            .to_string();

        match kind.as_str() {
            "Feature" => Ok(BoundarySource::Feature(from_value(&kind, value)?)),
            "FeatureCollection" => Ok(BoundarySource::FeatureCollection(from_value(
                &kind, value,
            )?)),
            _ => Ok(BoundarySource::Geometry(value)),
        }
    }

    /// Resolve to the single feature used for containment
    fn into_feature(self) -> Result<RawFeature, BoundaryError> {
        match self {
            BoundarySource::Feature(feature) => Ok(feature),
            BoundarySource::FeatureCollection(collection) => {
                let total = collection.features.len();
                let first = collection
                    .features
                    .into_iter()
                    .next()
                    .ok_or(BoundaryError::EmptyCollection)?;
                if total > 1 {
                    warn!(
                        "Feature collection has {} features, using the first and dropping {}",
                        total,
                        total - 1
                    );
                }
                Ok(first)
            }
            BoundarySource::Geometry(geometry) => Ok(RawFeature {
                properties: None,
                geometry: Some(geometry),
            }),
        }
    }
}

fn from_value<T: serde::de::DeserializeOwned>(
    kind: &str,
    value: Value,
) -> Result<T, BoundaryError> {
    serde_json::from_value(value).map_err(|source| BoundaryError::Malformed {
        kind: kind.to_string(),
        source,
    })
}

fn to_coord(position: &[f64]) -> Result<Coord<f64>, BoundaryError> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(BoundaryError::ShortPosition(position.len())),
    }
}

fn to_line_string(ring: &[Position]) -> Result<LineString<f64>, BoundaryError> {
    let coords = ring
        .iter()
        .map(|p| to_coord(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::new(coords))
}

/// Build a polygon from GeoJSON rings: the first ring is the exterior,
/// the rest are holes. Open rings are closed by `Polygon::new`.
fn to_polygon(rings: &[Ring]) -> Result<Polygon<f64>, BoundaryError> {
    let (exterior, interiors) = rings.split_first().ok_or(BoundaryError::EmptyPolygon)?;
    let exterior = to_line_string(exterior)?;
    let interiors = interiors
        .iter()
        .map(|r| to_line_string(r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn resolve_geometry(geometry: Option<Value>) -> Result<BoundaryGeometry, BoundaryError> {
    let Some(value) = geometry.filter(|v| !v.is_null()) else {
        return Ok(BoundaryGeometry::Unsupported {
            kind: "null".to_string(),
        });
    };

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(BoundaryError::MissingType)?
        .to_string();

    match kind.as_str() {
        "Polygon" => {
            let raw: RawPolygon = from_value(&kind, value)?;
            Ok(BoundaryGeometry::Polygon(to_polygon(&raw.coordinates)?))
        }
        "MultiPolygon" => {
            let raw: RawMultiPolygon = from_value(&kind, value)?;
            let polygons = raw
                .coordinates
                .iter()
                .map(|rings| to_polygon(rings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BoundaryGeometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        _ => Ok(BoundaryGeometry::Unsupported { kind }),
    }
}

/// Normalize a parsed GeoJSON value into a boundary feature.
pub fn load_boundary(
    source: Value,
    key: &str,
    name: &str,
) -> Result<BoundaryFeature, BoundaryError> {
    let feature = BoundarySource::parse(source)?.into_feature()?;
    let geometry = resolve_geometry(feature.geometry)?;

    if let BoundaryGeometry::Unsupported { kind } = &geometry {
        warn!(
            "Boundary '{}' has unsupported geometry type {}; it will never match",
            key, kind
        );
    }

    debug!(
        "Loaded boundary '{}' ({} polygons)",
        key,
        geometry.polygon_count()
    );

    Ok(BoundaryFeature::new(
        key,
        name,
        geometry,
        feature.properties.unwrap_or_default(),
    ))
}

/// Read and normalize a boundary file
pub fn load_boundary_file<P: AsRef<Path>>(
    path: P,
    key: &str,
    name: &str,
) -> Result<BoundaryFeature> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundary file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse boundary file {}", path.display()))?;
    let feature = load_boundary(value, key, name)
        .with_context(|| format!("Invalid boundary in {}", path.display()))?;
    Ok(feature)
}

//! HTTP API: router, shared state and handlers.

mod check;
mod error;

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::MunicipalityConfig;
use crate::geocoding::Geocoder;
use crate::pip::{load_boundary_file, MunicipalityIndex, PipService};

pub use check::{check_address, check_address_handler};
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    pub pip: PipService,
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub fn new(index: MunicipalityIndex, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            pip: PipService::new(index),
            geocoder,
        }
    }

    /// Load every configured boundary; any failure aborts startup
    pub fn load(
        municipalities: &[MunicipalityConfig],
        geocoder: Arc<dyn Geocoder>,
    ) -> Result<Self> {
        let mut boundaries = Vec::with_capacity(municipalities.len());
        for m in municipalities {
            info!("Loading boundary for {} from {}", m.name, m.path.display());
            boundaries.push(load_boundary_file(&m.path, &m.key, &m.name)?);
        }

        let index = MunicipalityIndex::build(boundaries)?;
        Ok(Self::new(index, geocoder))
    }
}

/// Build the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/check-address", post(check_address_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::GeocodeError;
    use crate::models::GeocodeResult;
    use crate::pip::{BoundaryFeature, BoundaryGeometry};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use geo::polygon;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const HOMESTEAD_POINT: (f64, f64) = (25.4687, -80.4776);

    enum Behavior {
        Resolve(f64, f64),
        Miss,
        Fail,
        Panic,
    }

    struct StubGeocoder {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubGeocoder {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Resolve(lat, lng) => Ok(GeocodeResult {
                    lat,
                    lng,
                    place_id: Some("place-1".to_string()),
                    formatted_address: Some(address.to_uppercase()),
                }),
                Behavior::Miss => Err(GeocodeError::NoResults),
                Behavior::Fail => Err(GeocodeError::Unexpected(anyhow::anyhow!("db exploded"))),
                Behavior::Panic => panic!("geocoder blew up"),
            }
        }
    }

    fn rect(key: &str, name: &str, lng: (f64, f64), lat: (f64, f64)) -> BoundaryFeature {
        let poly = polygon![
            (x: lng.0, y: lat.0),
            (x: lng.1, y: lat.0),
            (x: lng.1, y: lat.1),
            (x: lng.0, y: lat.1),
        ];
        BoundaryFeature::new(key, name, BoundaryGeometry::Polygon(poly), Map::new())
    }

    fn router(geocoder: Arc<StubGeocoder>) -> Router {
        let index = MunicipalityIndex::build(vec![
            rect("homestead", "Homestead", (-80.52, -80.42), (25.455, 25.51)),
            rect("floridacity", "Florida City", (-80.51, -80.46), (25.42, 25.452)),
        ])
        .unwrap();
        create_router(Arc::new(AppState::new(index, geocoder)))
    }

    async fn post_check(router: Router, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/check-address")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(StubGeocoder::new(Behavior::Miss))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_detects_city_without_request() {
        let (lat, lng) = HOMESTEAD_POINT;
        let geocoder = StubGeocoder::new(Behavior::Resolve(lat, lng));
        let (status, json) = post_check(
            router(geocoder.clone()),
            json!({ "address": "100 Civic Ct, Homestead" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["detected_city"], "homestead");
        assert_eq!(json["inside_any_city"], true);
        assert!(json["requested_city"].is_null());
        assert!(json["inside_selected"].is_null());
        assert_eq!(json["geocode"]["lat"], lat);
        assert_eq!(json["geocode"]["lng"], lng);
        assert_eq!(json["geocode"]["place_id"], "place-1");
        assert_eq!(json["geocode"]["formatted_address"], "100 CIVIC CT, HOMESTEAD");
        assert!(json["message"].as_str().unwrap().contains("Homestead"));
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_requested_city_outside() {
        let (lat, lng) = HOMESTEAD_POINT;
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Resolve(lat, lng))),
            json!({ "address": "100 Civic Ct", "city": "floridacity" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["requested_city"], "floridacity");
        assert_eq!(json["inside_selected"], false);
        assert_eq!(json["detected_city"], "homestead");
        assert_eq!(
            json["message"],
            "No, the address you've entered does not fall within the municipality of Florida City."
        );
    }

    #[tokio::test]
    async fn test_requested_city_inside() {
        let (lat, lng) = HOMESTEAD_POINT;
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Resolve(lat, lng))),
            json!({ "address": "100 Civic Ct", "city": "Homestead" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["requested_city"], "homestead");
        assert_eq!(json["inside_selected"], true);
        assert_eq!(
            json["message"],
            "Yes, the address you've entered falls within the municipality of Homestead."
        );
    }

    #[tokio::test]
    async fn test_unknown_city_ignored() {
        let (lat, lng) = HOMESTEAD_POINT;
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Resolve(lat, lng))),
            json!({ "address": "100 Civic Ct", "city": "miami" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["requested_city"].is_null());
        assert!(json["inside_selected"].is_null());
        assert_eq!(json["detected_city"], "homestead");
    }

    #[tokio::test]
    async fn test_far_point_inside_nothing() {
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Resolve(40.7128, -74.0060))),
            json!({ "address": "New York" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["detected_city"].is_null());
        assert_eq!(json["inside_any_city"], false);
        assert_eq!(
            json["message"],
            "The address you've entered does not fall within Homestead or Florida City."
        );
    }

    #[tokio::test]
    async fn test_missing_address_skips_geocoding() {
        let geocoder = StubGeocoder::new(Behavior::Resolve(0.0, 0.0));

        for body in [json!({}), json!({ "address": "" }), json!({ "address": "   " })] {
            let (status, json) = post_check(router(geocoder.clone()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "No address provided.");
        }

        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let geocoder = StubGeocoder::new(Behavior::Resolve(0.0, 0.0));
        let response = router(geocoder.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/check-address")
                    .header("content-type", "application/json")
                    .body(Body::from("{ not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_miss_is_not_found() {
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Miss)),
            json!({ "address": "nowhere at all" }),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Address could not be geocoded.");
    }

    #[tokio::test]
    async fn test_unexpected_failure_is_opaque() {
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Fail)),
            json!({ "address": "100 Civic Ct" }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let (status, json) = post_check(
            router(StubGeocoder::new(Behavior::Panic)),
            json!({ "address": "100 Civic Ct" }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_load_state_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.geojson");
        std::fs::write(
            &path,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                    }
                }]
            })
            .to_string(),
        )
        .unwrap();

        let configs = vec![MunicipalityConfig {
            key: "sq".to_string(),
            name: "Square".to_string(),
            path: path.clone(),
        }];
        let state = AppState::load(&configs, StubGeocoder::new(Behavior::Miss)).unwrap();
        assert_eq!(state.pip.index().len(), 1);

        let missing = vec![
            configs[0].clone(),
            MunicipalityConfig {
                key: "gone".to_string(),
                name: "Gone".to_string(),
                path: dir.path().join("gone.geojson"),
            },
        ];
        assert!(AppState::load(&missing, StubGeocoder::new(Behavior::Miss)).is_err());
    }

    #[test]
    fn test_shipped_config_places_homestead_point() {
        use crate::config::Config;
        use crate::models::GeoPoint;

        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
        let config = Config::load_from_file(path).unwrap();
        let state =
            AppState::load(&config.municipalities, StubGeocoder::new(Behavior::Miss)).unwrap();

        let (lat, lng) = HOMESTEAD_POINT;
        let eval = state.pip.evaluate(GeoPoint::new(lat, lng));
        assert_eq!(eval.detected().unwrap().key, "homestead");
        assert_eq!(eval.inside("floridacity"), Some(false));

        let keys: Vec<&str> = state.pip.index().boundaries().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["homestead", "floridacity"]);
    }
}

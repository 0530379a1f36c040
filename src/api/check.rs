//! Address check: validate, geocode, evaluate, respond.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, warn};

use super::{ApiError, AppState};
use crate::models::{CheckRequest, CheckResponse};
use crate::pip::{BoundaryFeature, Evaluation};

const NO_ADDRESS: &str = "No address provided.";
const INVALID_BODY: &str = "Invalid request body.";
const NOT_GEOCODED: &str = "Address could not be geocoded.";

/// `POST /check-address`
pub async fn check_address_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected check request body: {}", rejection.body_text());
        ApiError::BadRequest(INVALID_BODY.to_string())
    })?;

    check_address(&state, request).await.map(Json)
}

/// Run a single address check against the shared state
pub async fn check_address(
    state: &AppState,
    request: CheckRequest,
) -> Result<CheckResponse, ApiError> {
    let address = request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest(NO_ADDRESS.to_string()))?;

    let requested = match request.city.as_deref() {
        Some(city) => {
            let found = state.pip.index().get(city).cloned();
            if found.is_none() {
                debug!("Ignoring unknown city '{}'", city);
            }
            found
        }
        None => None,
    };

    let geocode = match state.geocoder.geocode(address).await {
        Ok(result) => result,
        Err(e) if e.is_soft() => {
            warn!("Could not geocode '{}': {}", address, e);
            return Err(ApiError::NotFound(NOT_GEOCODED.to_string()));
        }
        Err(e) => return Err(ApiError::Internal(format!("geocoder failed: {}", e))),
    };

    let evaluation = state.pip.evaluate(geocode.point());
    let detected = evaluation.detected();
    let inside_selected = requested
        .as_ref()
        .and_then(|boundary| evaluation.inside(&boundary.key));

    let message = build_message(&evaluation, requested.as_deref(), state);

    Ok(CheckResponse {
        requested_city: requested.as_ref().map(|b| b.key.clone()),
        detected_city: detected.map(|b| b.key.clone()),
        inside_selected,
        inside_any_city: evaluation.inside_any(),
        message,
        geocode,
    })
}

fn build_message(
    evaluation: &Evaluation,
    requested: Option<&BoundaryFeature>,
    state: &AppState,
) -> String {
    if let Some(boundary) = requested {
        return if evaluation.inside(&boundary.key).unwrap_or(false) {
            format!(
                "Yes, the address you've entered falls within the municipality of {}.",
                boundary.name
            )
        } else {
            format!(
                "No, the address you've entered does not fall within the municipality of {}.",
                boundary.name
            )
        };
    }

    match evaluation.detected() {
        Some(boundary) => format!(
            "The address you've entered falls within the municipality of {}.",
            boundary.name
        ),
        None => {
            let names: Vec<&str> = state
                .pip
                .index()
                .boundaries()
                .map(|b| b.name.as_str())
                .collect();
            format!(
                "The address you've entered does not fall within {}.",
                join_or(&names)
            )
        }
    }
}

/// "A", "A or B", "A, B or C"
fn join_or(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::json;

use crate::SharedState;
use crate::error::ApiError;

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    let features = state.service.features();
    let uptime = Utc::now().signed_duration_since(state.started_at);

    Ok(Json(json!({
        "status": "ok",
        "application": env!("CARGO_PKG_NAME"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": uptime.num_seconds().max(0),
        "external_service": if state.service.has_external() { "configured" } else { "none" },
        "features": {
            "matching": features.matching,
            "pricing": features.pricing,
            "prediction": features.prediction,
        },
    })))
}

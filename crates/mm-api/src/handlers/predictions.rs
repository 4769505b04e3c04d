use axum::{Json, extract::State, extract::rejection::JsonRejection};
use mm_common::api::{EngineResponse, PredictionRequest};
use mm_common::prediction::PredictionResult;
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub async fn predict_success(
    State(state): State<SharedState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<EngineResponse<PredictionResult>>, ApiError> {
    let Json(request) = payload?;
    let mission_id = request.mission.id.clone();

    let response = state.service.predict_success(request).await?;

    info!(
        mission_id = %mission_id,
        success_probability = response.result.success_probability,
        degraded = response.degraded,
        cache = response.cache.as_str(),
        "prediction served"
    );

    Ok(Json(response))
}

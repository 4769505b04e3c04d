use axum::{Json, extract::State, extract::rejection::JsonRejection};
use mm_common::api::{EngineResponse, MatchRequest};
use mm_common::matching::MatchResult;
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub async fn run_match(
    State(state): State<SharedState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<EngineResponse<Vec<MatchResult>>>, ApiError> {
    let Json(request) = payload?;
    let mission_id = request.mission.id.clone();
    let candidates = request.providers.len();

    let response = state.service.match_providers(request).await?;

    info!(
        mission_id = %mission_id,
        candidates,
        returned = response.result.len(),
        degraded = response.degraded,
        cache = response.cache.as_str(),
        "match served"
    );

    Ok(Json(response))
}

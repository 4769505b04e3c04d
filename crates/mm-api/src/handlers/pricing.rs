use axum::{Json, extract::State, extract::rejection::JsonRejection};
use mm_common::api::{EngineResponse, PriceRequest};
use mm_common::pricing::PricingResult;
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub async fn run_pricing(
    State(state): State<SharedState>,
    payload: Result<Json<PriceRequest>, JsonRejection>,
) -> Result<Json<EngineResponse<PricingResult>>, ApiError> {
    let Json(request) = payload?;
    let mission_id = request.mission.id.clone();

    let response = state.service.price(request).await?;

    info!(
        mission_id = %mission_id,
        optimal_price = response.result.optimal_price,
        degraded = response.degraded,
        cache = response.cache.as_str(),
        "price served"
    );

    Ok(Json(response))
}

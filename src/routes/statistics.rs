//! Statistics route handler

use crate::error::ApiResult;
use crate::models::{ReviewStats, SuccessResponse};
use crate::state::SharedState;
use axum::{extract::State, Json};

pub async fn get_statistics(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<ReviewStats>>> {
    let stats = state.statistics.get_statistics().await?;
    Ok(Json(SuccessResponse::with_data(
        "Statistics retrieved successfully.",
        stats,
    )))
}

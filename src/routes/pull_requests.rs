//! Pull request route handlers

use crate::error::{ApiResult, AppError};
use crate::models::{
    CreatePullRequestRequest, PullRequest, ReassignReviewerRequest, Reassignment, SuccessResponse,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Open a pull request and assign reviewers
pub async fn create_pull_request(
    State(state): State<SharedState>,
    Json(payload): Json<CreatePullRequestRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<PullRequest>>)> {
    debug!("Creating pull request: {}", payload.title);
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let pr = state
        .pull_requests
        .create_pull_request(payload.title, payload.author_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Pull request created successfully.",
            pr,
        )),
    ))
}

pub async fn list_pull_requests(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<PullRequest>>>> {
    let prs = state.pull_requests.list_pull_requests().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} pull request(s).", prs.len()),
        prs,
    )))
}

pub async fn get_pull_request(
    State(state): State<SharedState>,
    Path(pull_request_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<PullRequest>>> {
    let pr = state.pull_requests.get_pull_request(pull_request_id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Pull request retrieved successfully.",
        pr,
    )))
}

/// Replace one reviewer with a random teammate
pub async fn reassign_reviewer(
    State(state): State<SharedState>,
    Path(pull_request_id): Path<Uuid>,
    Json(payload): Json<ReassignReviewerRequest>,
) -> ApiResult<Json<SuccessResponse<Reassignment>>> {
    let result = state
        .pull_requests
        .reassign_reviewer(pull_request_id, payload.reviewer_id)
        .await?;
    Ok(Json(SuccessResponse::with_data(
        "Reviewer reassigned successfully.",
        result,
    )))
}

pub async fn merge_pull_request(
    State(state): State<SharedState>,
    Path(pull_request_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<PullRequest>>> {
    let pr = state
        .pull_requests
        .merge_pull_request(pull_request_id)
        .await?;
    Ok(Json(SuccessResponse::with_data(
        "Pull request merged successfully.",
        pr,
    )))
}

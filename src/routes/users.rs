//! User route handlers

use crate::error::{ApiResult, AppError};
use crate::models::{
    CreateUserRequest, MessageResponse, PullRequest, SuccessResponse, UpdateUserRequest, User,
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

/// Create a new user
pub async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<User>>)> {
    debug!("Creating user: {}", payload.username);
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .users
        .create_user(payload.username, payload.team_id, payload.is_active)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("User created successfully.", user)),
    ))
}

pub async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    let user = state.users.get_user(user_id).await?;
    Ok(Json(SuccessResponse::with_data(
        "User retrieved successfully.",
        user,
    )))
}

/// Update the fields present in the body
pub async fn update_user(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.users.update_user(user_id, payload).await?;
    Ok(Json(SuccessResponse::with_data(
        "User updated successfully.",
        user,
    )))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.users.delete_user(user_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "User {} deleted successfully.",
        user_id
    ))))
}

/// Pull requests the user is currently reviewing
pub async fn get_user_reviews(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<Vec<PullRequest>>>> {
    let reviews = state.users.get_reviews_assigned_to_user(user_id).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} pull request(s) assigned for review.", reviews.len()),
        reviews,
    )))
}

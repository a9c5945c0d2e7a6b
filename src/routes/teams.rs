//! Team route handlers

use crate::error::{ApiResult, AppError};
use crate::models::{
    CreateTeamRequest, MessageResponse, SuccessResponse, Team, TeamWithMembers, UpdateTeamRequest,
};
use crate::review::DeactivationReport;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Create a new team
pub async fn create_team(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Team>>)> {
    debug!("Creating team: {}", payload.name);
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let team = state.teams.create_team(payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Team created successfully.", team)),
    ))
}

/// Get a team with its members
pub async fn get_team(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<TeamWithMembers>>> {
    let team = state.teams.get_team(team_id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Team retrieved successfully.",
        team,
    )))
}

pub async fn update_team(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<UpdateTeamRequest>,
) -> ApiResult<Json<SuccessResponse<Team>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let team = state.teams.update_team(team_id, payload.name).await?;
    Ok(Json(SuccessResponse::with_data(
        "Team updated successfully.",
        team,
    )))
}

pub async fn delete_team(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.teams.delete_team(team_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Team {} deleted successfully.",
        team_id
    ))))
}

/// Reassign the team's open reviews and deactivate its members
pub async fn deactivate_members(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<DeactivationReport>>> {
    info!("Deactivating members of team {}", team_id);
    let report = state.deactivation.deactivate_team_members(team_id).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Deactivated {} team member(s).", report.deactivated_count),
        report,
    )))
}

//! Team models and DTOs

use super::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A group of users who review each other's pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
}

/// A team together with its members, ordered by username
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<User>,
}

/// Request to create a team
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Team name must be between 1 and 255 characters"))]
    pub name: String,
}

/// Request to rename a team
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Team name must be between 1 and 255 characters"))]
    pub name: String,
}

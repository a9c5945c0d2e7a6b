//! User models and DTOs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("username pattern is valid"));

/// A team member who may author pull requests and review them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub team_id: Option<Uuid>,
    /// Only active users are ever picked as reviewers
    pub is_active: bool,
}

/// Request to create a new user
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be between 1 and 255 characters"))]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request to update a user; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be between 1 and 255 characters"))]
    pub username: Option<String>,
    /// `null` removes the user from their team
    #[serde(default, deserialize_with = "super::present")]
    pub team_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

fn default_active() -> bool {
    true
}

/// Usernames are restricted to letters, digits, `_`, `.` and `-`
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_PATTERN.is_match(username) {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some(
            "Username may only contain letters, digits, underscores, dots and dashes".into(),
        );
        return Err(err);
    }
    Ok(())
}

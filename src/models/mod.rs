//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the domain entities and all request/response structures used by
//! the API.

pub mod pull_request;
pub mod statistics;
pub mod team;
pub mod user;

// Re-export commonly used types
pub use pull_request::*;
pub use statistics::*;
pub use team::*;
pub use user::*;

use serde::{Deserialize, Deserializer, Serialize};

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Message-only response (no data)
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
///
/// Used as `#[serde(default, deserialize_with = "present")]` on
/// `Option<Option<T>>` fields: missing → `None`, `null` → `Some(None)`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

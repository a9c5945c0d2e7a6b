//! Pull request models and DTOs

use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Upper bound on reviewers per pull request
pub const MAX_REVIEWERS: usize = 2;

/// Pull request lifecycle state. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[postgres(name = "pr_status")]
pub enum PrStatus {
    #[postgres(name = "OPEN")]
    Open,
    #[postgres(name = "MERGED")]
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request and its currently assigned reviewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub status: PrStatus,
    /// Ordered by assignment time, oldest first
    pub reviewers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Build a fresh OPEN pull request with its initial reviewers
    pub fn open(title: String, author_id: Uuid, reviewers: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author_id,
            status: PrStatus::Open,
            reviewers,
            created_at: Utc::now(),
            merged_at: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: Uuid) -> bool {
        self.reviewers.contains(&user_id)
    }
}

/// One reviewer link: who reviews which pull request since when
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerAssignment {
    pub pull_request_id: Uuid,
    pub reviewer_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Result of a successful reviewer swap
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
    pub pull_request: PullRequest,
    pub replaced_reviewer_id: Uuid,
    pub new_reviewer_id: Uuid,
}

/// Request to open a pull request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequestRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be between 1 and 500 characters"))]
    pub title: String,
    pub author_id: Uuid,
}

/// Request to replace one reviewer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignReviewerRequest {
    pub reviewer_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_pull_request() {
        let author = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let pr = PullRequest::open("Add retries".to_string(), author, vec![reviewer]);

        assert_eq!(pr.status, PrStatus::Open);
        assert!(pr.merged_at.is_none());
        assert!(pr.has_reviewer(reviewer));
        assert!(!pr.has_reviewer(author));
        assert!(!pr.is_merged());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&PrStatus::Open).unwrap(), "\"OPEN\"");
        assert_eq!(
            serde_json::from_str::<PrStatus>("\"MERGED\"").unwrap(),
            PrStatus::Merged
        );
        assert_eq!(PrStatus::Merged.to_string(), "MERGED");
    }
}

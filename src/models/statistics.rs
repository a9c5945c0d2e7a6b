//! Review assignment statistics

use super::PrStatus;
use serde::Serialize;
use uuid::Uuid;

/// How many entries the per-user and per-PR breakdowns keep
pub const STATS_TOP_N: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_assignments: u64,
    pub assignments_by_user: Vec<UserAssignmentStats>,
    pub assignments_by_pull_request: Vec<PullRequestAssignmentStats>,
    pub total_pull_requests: u64,
    pub open_pull_requests: u64,
    pub merged_pull_requests: u64,
    pub average_reviewers_per_pull_request: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignmentStats {
    pub user_id: Uuid,
    pub username: String,
    pub assignments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestAssignmentStats {
    pub pull_request_id: Uuid,
    pub title: String,
    pub reviewers_count: u64,
    pub status: PrStatus,
}

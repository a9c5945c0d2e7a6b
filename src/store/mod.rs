//! Persistence collaborators
//!
//! The review engine never talks to a database directly. It is handed
//! implementations of these traits at construction time: the PostgreSQL
//! stores in [`crate::db`] in production, or [`MemoryStore`] for tests and
//! throwaway deployments.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{PullRequest, ReviewStats, Team, User};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Users, teams and team membership
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a team. Fails with `Conflict` if the name is taken.
    async fn create_team(&self, team: &Team) -> Result<(), AppError>;

    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError>;

    async fn get_team_by_name(&self, name: &str) -> Result<Option<Team>, AppError>;

    /// Rename a team. `None` if it does not exist.
    async fn update_team(&self, team: &Team) -> Result<Option<Team>, AppError>;

    /// Delete a team and detach its members. `false` if it did not exist.
    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError>;

    /// All members, active or not, ordered by username
    async fn get_team_members(&self, team_id: Uuid) -> Result<Vec<User>, AppError>;

    /// Active members not listed in `exclude`, ordered by username
    async fn get_active_team_members(
        &self,
        team_id: Uuid,
        exclude: &[Uuid],
    ) -> Result<Vec<User>, AppError>;

    /// Flip every active member to inactive; returns how many changed
    async fn deactivate_team_members(&self, team_id: Uuid) -> Result<u64, AppError>;

    /// Insert a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Overwrite a user's fields. `None` if the user does not exist.
    async fn update_user(&self, user: &User) -> Result<Option<User>, AppError>;

    /// Delete a user. Fails with `Conflict` while pull requests reference
    /// them; `false` if they did not exist.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

/// What happened to an attempted reviewer swap.
///
/// The store decides this under the same lock or transaction that performs
/// the swap, so the answer is never stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped,
    PullRequestMissing,
    Merged,
    OldReviewerNotAssigned,
    NewReviewerAlreadyAssigned,
}

/// Pull requests and their reviewer links
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Persist the pull request and a link for every entry of
    /// `pr.reviewers`, all or nothing.
    async fn create_pull_request(&self, pr: &PullRequest) -> Result<(), AppError>;

    async fn get_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError>;

    /// Every pull request, newest first
    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, AppError>;

    /// Pull requests on which `reviewer_id` currently reviews, newest first
    async fn list_pull_requests_by_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<PullRequest>, AppError>;

    /// Atomically replace `old_reviewer` with `new_reviewer`, re-checking
    /// that the pull request is still open and `old_reviewer` still assigned.
    async fn swap_reviewer(
        &self,
        pr_id: Uuid,
        old_reviewer: Uuid,
        new_reviewer: Uuid,
    ) -> Result<SwapOutcome, AppError>;

    /// Mark the pull request merged unless it already is. Returns the
    /// resulting state, or `None` if it does not exist.
    async fn merge_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError>;
}

/// Aggregated assignment statistics
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    async fn review_stats(&self) -> Result<ReviewStats, AppError>;
}

/// The set of store handles the services are built from
#[derive(Clone)]
pub struct Stores {
    pub membership: Arc<dyn MembershipStore>,
    pub pull_requests: Arc<dyn PullRequestStore>,
    pub statistics: Arc<dyn StatisticsStore>,
}

impl Stores {
    /// All three roles served by one shared in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            membership: store.clone(),
            pull_requests: store.clone(),
            statistics: store,
        }
    }
}

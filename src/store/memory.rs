//! In-memory store
//!
//! Keeps users, teams and pull requests in one `RwLock`-guarded state. Every
//! mutating operation takes the write lock once and finishes before
//! releasing it, which gives the same all-or-nothing behaviour the
//! PostgreSQL stores get from transactions.

use crate::error::{conflict_error, AppError};
use crate::models::{
    PrStatus, PullRequest, PullRequestAssignmentStats, ReviewStats, ReviewerAssignment, Team,
    User, UserAssignmentStats, STATS_TOP_N,
};
use crate::store::{MembershipStore, PullRequestStore, StatisticsStore, SwapOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
struct StoredPullRequest {
    id: Uuid,
    title: String,
    author_id: Uuid,
    status: PrStatus,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    /// Kept in assignment order
    assignments: Vec<ReviewerAssignment>,
}

impl StoredPullRequest {
    fn to_model(&self) -> PullRequest {
        PullRequest {
            id: self.id,
            title: self.title.clone(),
            author_id: self.author_id,
            status: self.status,
            reviewers: self.assignments.iter().map(|a| a.reviewer_id).collect(),
            created_at: self.created_at,
            merged_at: self.merged_at,
        }
    }

    fn is_assigned(&self, user_id: Uuid) -> bool {
        self.assignments.iter().any(|a| a.reviewer_id == user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MemoryState {
    teams: HashMap<Uuid, Team>,
    users: HashMap<Uuid, User>,
    pull_requests: HashMap<Uuid, StoredPullRequest>,
}

impl MemoryState {
    fn sorted_users<'a>(users: impl Iterator<Item = &'a User>) -> Vec<User> {
        let mut users: Vec<User> = users.cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    fn pull_requests_newest_first<'a>(
        prs: impl Iterator<Item = &'a StoredPullRequest>,
    ) -> Vec<PullRequest> {
        let mut prs: Vec<&StoredPullRequest> = prs.collect();
        prs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        prs.into_iter().map(StoredPullRequest::to_model).collect()
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn team_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.teams
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }
}

/// Thread-safe in-memory implementation of every store trait
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Copy of the whole state, for asserting that nothing was written
    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> MemoryState {
        self.state.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_team(&self, team: &Team) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.team_name_taken(&team.name, None) {
            return Err(conflict_error(format!("Team '{}' already exists", team.name)));
        }
        state.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        Ok(self.state.read().await.teams.get(&id).cloned())
    }

    async fn get_team_by_name(&self, name: &str) -> Result<Option<Team>, AppError> {
        let state = self.state.read().await;
        Ok(state.teams.values().find(|t| t.name == name).cloned())
    }

    async fn update_team(&self, team: &Team) -> Result<Option<Team>, AppError> {
        let mut state = self.state.write().await;
        if !state.teams.contains_key(&team.id) {
            return Ok(None);
        }
        if state.team_name_taken(&team.name, Some(team.id)) {
            return Err(conflict_error(format!("Team '{}' already exists", team.name)));
        }
        state.teams.insert(team.id, team.clone());
        Ok(Some(team.clone()))
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.teams.remove(&id).is_none() {
            return Ok(false);
        }
        for user in state.users.values_mut() {
            if user.team_id == Some(id) {
                user.team_id = None;
            }
        }
        Ok(true)
    }

    async fn get_team_members(&self, team_id: Uuid) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(MemoryState::sorted_users(
            state.users.values().filter(|u| u.team_id == Some(team_id)),
        ))
    }

    async fn get_active_team_members(
        &self,
        team_id: Uuid,
        exclude: &[Uuid],
    ) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(MemoryState::sorted_users(state.users.values().filter(|u| {
            u.team_id == Some(team_id) && u.is_active && !exclude.contains(&u.id)
        })))
    }

    async fn deactivate_team_members(&self, team_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for user in state.users.values_mut() {
            if user.team_id == Some(team_id) && user.is_active {
                user.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.username_taken(&user.username, None) {
            return Err(conflict_error(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if let Some(team_id) = user.team_id {
            if !state.teams.contains_key(&team_id) {
                return Err(AppError::TeamNotFound(team_id));
            }
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Ok(None);
        }
        if state.username_taken(&user.username, Some(user.id)) {
            return Err(conflict_error(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if let Some(team_id) = user.team_id {
            if !state.teams.contains_key(&team_id) {
                return Err(AppError::TeamNotFound(team_id));
            }
        }
        state.users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }
        let referenced = state
            .pull_requests
            .values()
            .any(|pr| pr.author_id == id || pr.is_assigned(id));
        if referenced {
            return Err(conflict_error(format!(
                "User {} is referenced by pull requests and cannot be deleted",
                id
            )));
        }
        state.users.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl PullRequestStore for MemoryStore {
    async fn create_pull_request(&self, pr: &PullRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.pull_requests.contains_key(&pr.id) {
            return Err(conflict_error(format!("Pull request {} already exists", pr.id)));
        }
        if !state.users.contains_key(&pr.author_id) {
            return Err(AppError::AuthorNotFound(pr.author_id));
        }
        if let Some(missing) = pr.reviewers.iter().find(|r| !state.users.contains_key(r)) {
            return Err(AppError::UserNotFound(*missing));
        }

        let assignments = pr
            .reviewers
            .iter()
            .map(|&reviewer_id| ReviewerAssignment {
                pull_request_id: pr.id,
                reviewer_id,
                assigned_at: pr.created_at,
            })
            .collect();

        state.pull_requests.insert(
            pr.id,
            StoredPullRequest {
                id: pr.id,
                title: pr.title.clone(),
                author_id: pr.author_id,
                status: pr.status,
                created_at: pr.created_at,
                merged_at: pr.merged_at,
                assignments,
            },
        );
        Ok(())
    }

    async fn get_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.get(&id).map(StoredPullRequest::to_model))
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, AppError> {
        let state = self.state.read().await;
        Ok(MemoryState::pull_requests_newest_first(
            state.pull_requests.values(),
        ))
    }

    async fn list_pull_requests_by_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<PullRequest>, AppError> {
        let state = self.state.read().await;
        Ok(MemoryState::pull_requests_newest_first(
            state
                .pull_requests
                .values()
                .filter(|pr| pr.is_assigned(reviewer_id)),
        ))
    }

    async fn swap_reviewer(
        &self,
        pr_id: Uuid,
        old_reviewer: Uuid,
        new_reviewer: Uuid,
    ) -> Result<SwapOutcome, AppError> {
        let mut state = self.state.write().await;
        let Some(pr) = state.pull_requests.get_mut(&pr_id) else {
            return Ok(SwapOutcome::PullRequestMissing);
        };
        if pr.status == PrStatus::Merged {
            return Ok(SwapOutcome::Merged);
        }
        if !pr.is_assigned(old_reviewer) {
            return Ok(SwapOutcome::OldReviewerNotAssigned);
        }
        if pr.is_assigned(new_reviewer) {
            return Ok(SwapOutcome::NewReviewerAlreadyAssigned);
        }

        pr.assignments.retain(|a| a.reviewer_id != old_reviewer);
        pr.assignments.push(ReviewerAssignment {
            pull_request_id: pr_id,
            reviewer_id: new_reviewer,
            assigned_at: Utc::now(),
        });
        Ok(SwapOutcome::Swapped)
    }

    async fn merge_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError> {
        let mut state = self.state.write().await;
        let Some(pr) = state.pull_requests.get_mut(&id) else {
            return Ok(None);
        };
        if pr.status == PrStatus::Open {
            pr.status = PrStatus::Merged;
            pr.merged_at = Some(Utc::now());
        }
        Ok(Some(pr.to_model()))
    }
}

#[async_trait]
impl StatisticsStore for MemoryStore {
    async fn review_stats(&self) -> Result<ReviewStats, AppError> {
        let state = self.state.read().await;

        let mut per_user: HashMap<Uuid, u64> = HashMap::new();
        for pr in state.pull_requests.values() {
            for assignment in &pr.assignments {
                *per_user.entry(assignment.reviewer_id).or_default() += 1;
            }
        }

        let mut assignments_by_user: Vec<UserAssignmentStats> = state
            .users
            .values()
            .map(|u| UserAssignmentStats {
                user_id: u.id,
                username: u.username.clone(),
                assignments: per_user.get(&u.id).copied().unwrap_or(0),
            })
            .collect();
        assignments_by_user.sort_by(|a, b| {
            b.assignments
                .cmp(&a.assignments)
                .then_with(|| a.username.cmp(&b.username))
        });
        assignments_by_user.truncate(STATS_TOP_N);

        let mut assignments_by_pull_request: Vec<PullRequestAssignmentStats> = state
            .pull_requests
            .values()
            .map(|pr| PullRequestAssignmentStats {
                pull_request_id: pr.id,
                title: pr.title.clone(),
                reviewers_count: pr.assignments.len() as u64,
                status: pr.status,
            })
            .collect();
        assignments_by_pull_request.sort_by(|a, b| {
            b.reviewers_count
                .cmp(&a.reviewers_count)
                .then_with(|| a.title.cmp(&b.title))
        });
        assignments_by_pull_request.truncate(STATS_TOP_N);

        let total_assignments: u64 = per_user.values().sum();
        let total_pull_requests = state.pull_requests.len() as u64;
        let open_pull_requests = state
            .pull_requests
            .values()
            .filter(|pr| pr.status == PrStatus::Open)
            .count() as u64;

        Ok(ReviewStats {
            total_assignments,
            assignments_by_user,
            assignments_by_pull_request,
            total_pull_requests,
            open_pull_requests,
            merged_pull_requests: total_pull_requests - open_pull_requests,
            average_reviewers_per_pull_request: if total_pull_requests == 0 {
                0.0
            } else {
                total_assignments as f64 / total_pull_requests as f64
            },
        })
    }
}

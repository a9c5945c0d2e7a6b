//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::review::{
    DeactivationOrchestrator, PullRequestService, ReviewerRng, StatisticsService, TeamService,
    UserService,
};
use crate::store::Stores;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub teams: TeamService,

    pub users: UserService,

    /// Pull request lifecycle engine
    pub pull_requests: Arc<PullRequestService>,

    /// Team-wide deactivation, built on top of the lifecycle engine
    pub deactivation: DeactivationOrchestrator,

    pub statistics: StatisticsService,
}

impl AppState {
    /// Wire every service to the given stores
    pub fn new(stores: Stores, rng: ReviewerRng) -> Self {
        let pull_requests = Arc::new(PullRequestService::new(
            stores.membership.clone(),
            stores.pull_requests.clone(),
            Arc::new(rng),
        ));

        Self {
            teams: TeamService::new(stores.membership.clone()),
            users: UserService::new(stores.membership.clone(), stores.pull_requests.clone()),
            deactivation: DeactivationOrchestrator::new(
                stores.membership,
                stores.pull_requests,
                pull_requests.clone(),
            ),
            pull_requests,
            statistics: StatisticsService::new(stores.statistics),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

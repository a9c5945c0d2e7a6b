//! Review assignment engine
//!
//! 1. **Selection**: random, duplicate-free choice of reviewers from a pool
//! 2. **Lifecycle**: open pull requests, reassign reviewers, merge
//! 3. **Deactivation**: move a team's open reviews elsewhere and retire it
//!
//! Membership and statistics services sit alongside for the HTTP API.

pub mod deactivation;
pub mod lifecycle;
pub mod membership;
pub mod selection;
pub mod statistics;

pub use deactivation::{DeactivationOrchestrator, DeactivationReport};
pub use lifecycle::PullRequestService;
pub use membership::{TeamService, UserService};
pub use selection::ReviewerRng;
pub use statistics::StatisticsService;

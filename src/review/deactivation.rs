//! Team-wide deactivation
//!
//! Moves every open review held by a team's active members to someone else
//! before flipping those members to inactive. Each reassignment is its own
//! atomic operation; a failure on one pull request is recorded in the report
//! and the run carries on.

use crate::error::AppError;
use crate::review::lifecycle::PullRequestService;
use crate::store::{MembershipStore, PullRequestStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationReport {
    pub team_id: Uuid,
    pub deactivated_count: u64,
    pub reassignments: Vec<ReassignmentResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentResult {
    pub pull_request_id: Uuid,
    pub reviewer_id: Uuid,
    pub outcome: ReassignmentOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReassignmentOutcome {
    #[serde(rename_all = "camelCase")]
    Reassigned { new_reviewer_id: Uuid },
    Skipped { reason: String },
}

pub struct DeactivationOrchestrator {
    membership: Arc<dyn MembershipStore>,
    pull_requests: Arc<dyn PullRequestStore>,
    lifecycle: Arc<PullRequestService>,
}

impl DeactivationOrchestrator {
    pub fn new(
        membership: Arc<dyn MembershipStore>,
        pull_requests: Arc<dyn PullRequestStore>,
        lifecycle: Arc<PullRequestService>,
    ) -> Self {
        Self {
            membership,
            pull_requests,
            lifecycle,
        }
    }

    /// Reassign the team's open reviews, then deactivate its active members.
    ///
    /// Not transactional as a whole. Running it again on the same team is
    /// harmless: the second run finds no active members and writes nothing.
    pub async fn deactivate_team_members(
        &self,
        team_id: Uuid,
    ) -> Result<DeactivationReport, AppError> {
        self.membership
            .get_team(team_id)
            .await?
            .ok_or(AppError::TeamNotFound(team_id))?;

        let active = self.membership.get_active_team_members(team_id, &[]).await?;
        if active.is_empty() {
            debug!("Team {} has no active members to deactivate", team_id);
            return Ok(DeactivationReport {
                team_id,
                deactivated_count: 0,
                reassignments: Vec::new(),
            });
        }
        let active_ids: HashSet<Uuid> = active.iter().map(|u| u.id).collect();

        let mut reassignments = Vec::new();
        for pr in self.pull_requests.list_pull_requests().await? {
            if pr.is_merged() {
                continue;
            }
            let affected: Vec<Uuid> = pr
                .reviewers
                .iter()
                .copied()
                .filter(|id| active_ids.contains(id))
                .collect();

            for reviewer_id in affected {
                let outcome = match self.lifecycle.reassign_reviewer(pr.id, reviewer_id).await {
                    Ok(result) => ReassignmentOutcome::Reassigned {
                        new_reviewer_id: result.new_reviewer_id,
                    },
                    Err(e) => {
                        warn!(
                            "Could not reassign reviewer {} on pull request {}: {}",
                            reviewer_id, pr.id, e
                        );
                        ReassignmentOutcome::Skipped {
                            reason: e.to_string(),
                        }
                    }
                };
                reassignments.push(ReassignmentResult {
                    pull_request_id: pr.id,
                    reviewer_id,
                    outcome,
                });
            }
        }

        let deactivated_count = self.membership.deactivate_team_members(team_id).await?;
        info!(
            "Deactivated {} member(s) of team {} ({} reassignment attempt(s))",
            deactivated_count,
            team_id,
            reassignments.len()
        );

        Ok(DeactivationReport {
            team_id,
            deactivated_count,
            reassignments,
        })
    }
}

//! Pull request lifecycle: open with reviewers, reassign, merge

use crate::error::AppError;
use crate::models::{PullRequest, Reassignment, MAX_REVIEWERS};
use crate::review::selection::{pick_one, select_reviewers, ReviewerRng};
use crate::store::{MembershipStore, PullRequestStore, SwapOutcome};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct PullRequestService {
    users: Arc<dyn MembershipStore>,
    pull_requests: Arc<dyn PullRequestStore>,
    rng: Arc<ReviewerRng>,
}

impl PullRequestService {
    pub fn new(
        users: Arc<dyn MembershipStore>,
        pull_requests: Arc<dyn PullRequestStore>,
        rng: Arc<ReviewerRng>,
    ) -> Self {
        Self {
            users,
            pull_requests,
            rng,
        }
    }

    /// Open a pull request and assign up to two active teammates of the
    /// author. Having nobody to assign is not an error.
    pub async fn create_pull_request(
        &self,
        title: String,
        author_id: Uuid,
    ) -> Result<PullRequest, AppError> {
        let author = self
            .users
            .get_user(author_id)
            .await?
            .ok_or(AppError::AuthorNotFound(author_id))?;

        let candidates = match author.team_id {
            Some(team_id) => {
                self.users
                    .get_active_team_members(team_id, &[author.id])
                    .await?
            }
            None => Vec::new(),
        };

        let reviewers = select_reviewers(&candidates, MAX_REVIEWERS, &mut self.rng.fork());
        let pr = PullRequest::open(title, author.id, reviewers);
        self.pull_requests.create_pull_request(&pr).await?;

        info!(
            "Created pull request {} by {} with {} reviewer(s)",
            pr.id,
            author.username,
            pr.reviewers.len()
        );
        Ok(pr)
    }

    pub async fn get_pull_request(&self, id: Uuid) -> Result<PullRequest, AppError> {
        debug!("Fetching pull request {}", id);
        self.pull_requests
            .get_pull_request(id)
            .await?
            .ok_or(AppError::PrNotFound(id))
    }

    /// Every pull request, newest first
    pub async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, AppError> {
        self.pull_requests.list_pull_requests().await
    }

    /// Replace `old_reviewer_id` with a random active member of their team.
    ///
    /// The author and every current reviewer are excluded from the draw.
    /// The final swap is re-checked by the store, so a merge or another
    /// reassignment racing with this one is reported instead of overwritten.
    pub async fn reassign_reviewer(
        &self,
        pr_id: Uuid,
        old_reviewer_id: Uuid,
    ) -> Result<Reassignment, AppError> {
        let pr = self.get_pull_request(pr_id).await?;
        if pr.is_merged() {
            return Err(AppError::PrMerged(pr_id));
        }
        if !pr.has_reviewer(old_reviewer_id) {
            return Err(AppError::ReviewerNotAssigned {
                pull_request_id: pr_id,
                reviewer_id: old_reviewer_id,
            });
        }

        let old_reviewer = self
            .users
            .get_user(old_reviewer_id)
            .await?
            .ok_or(AppError::UserNotFound(old_reviewer_id))?;

        let mut exclude = Vec::with_capacity(pr.reviewers.len() + 1);
        exclude.push(pr.author_id);
        exclude.extend(pr.reviewers.iter().copied());

        let candidates = match old_reviewer.team_id {
            Some(team_id) => self.users.get_active_team_members(team_id, &exclude).await?,
            None => Vec::new(),
        };

        let new_reviewer_id = pick_one(&candidates, &mut self.rng.fork())
            .ok_or(AppError::NoAvailableReviewers(old_reviewer_id))?;

        match self
            .pull_requests
            .swap_reviewer(pr_id, old_reviewer_id, new_reviewer_id)
            .await?
        {
            SwapOutcome::Swapped => {}
            SwapOutcome::PullRequestMissing => return Err(AppError::PrNotFound(pr_id)),
            SwapOutcome::Merged => return Err(AppError::PrMerged(pr_id)),
            SwapOutcome::OldReviewerNotAssigned => {
                return Err(AppError::ReviewerNotAssigned {
                    pull_request_id: pr_id,
                    reviewer_id: old_reviewer_id,
                })
            }
            SwapOutcome::NewReviewerAlreadyAssigned => {
                return Err(AppError::Conflict(format!(
                    "User {} was assigned to pull request {} concurrently",
                    new_reviewer_id, pr_id
                )))
            }
        }

        let pull_request = self.get_pull_request(pr_id).await?;
        info!(
            "Reassigned pull request {}: {} -> {}",
            pr_id, old_reviewer_id, new_reviewer_id
        );

        Ok(Reassignment {
            pull_request,
            replaced_reviewer_id: old_reviewer_id,
            new_reviewer_id,
        })
    }

    /// Mark a pull request merged. Merging twice returns the existing state.
    pub async fn merge_pull_request(&self, id: Uuid) -> Result<PullRequest, AppError> {
        let current = self.get_pull_request(id).await?;
        if current.is_merged() {
            debug!("Pull request {} already merged", id);
            return Ok(current);
        }

        let merged = self
            .pull_requests
            .merge_pull_request(id)
            .await?
            .ok_or(AppError::PrNotFound(id))?;
        info!("Merged pull request {}", id);
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{PrStatus, Team, User};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: Arc<PullRequestService>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let service = Arc::new(PullRequestService::new(
                store.clone(),
                store.clone(),
                Arc::new(ReviewerRng::seeded(2024)),
            ));
            Self { store, service }
        }

        async fn team(&self, name: &str) -> Uuid {
            let team = Team {
                id: Uuid::new_v4(),
                name: name.to_string(),
            };
            self.store.create_team(&team).await.unwrap();
            team.id
        }

        async fn user(&self, name: &str, team_id: Option<Uuid>, is_active: bool) -> Uuid {
            let user = User {
                id: Uuid::new_v4(),
                username: name.to_string(),
                team_id,
                is_active,
            };
            self.store.create_user(&user).await.unwrap();
            user.id
        }
    }

    #[tokio::test]
    async fn test_create_assigns_two_of_three_teammates() {
        let fx = Fixture::new();
        let team = fx.team("payments").await;
        let author = fx.user("u1", Some(team), true).await;
        let teammates: HashSet<Uuid> = [
            fx.user("u2", Some(team), true).await,
            fx.user("u3", Some(team), true).await,
            fx.user("u4", Some(team), true).await,
        ]
        .into_iter()
        .collect();

        let pr = fx
            .service
            .create_pull_request("Add refunds".to_string(), author)
            .await
            .unwrap();

        assert_eq!(pr.status, PrStatus::Open);
        assert_eq!(pr.reviewers.len(), 2);
        assert_ne!(pr.reviewers[0], pr.reviewers[1]);
        assert!(pr.reviewers.iter().all(|r| teammates.contains(r)));
        assert!(!pr.has_reviewer(author));

        let stored = fx.service.get_pull_request(pr.id).await.unwrap();
        assert_eq!(stored, pr);
    }

    #[tokio::test]
    async fn test_create_with_lone_active_teammate() {
        let fx = Fixture::new();
        let team = fx.team("infra").await;
        let author = fx.user("u1", Some(team), true).await;
        let active = fx.user("u2", Some(team), true).await;
        fx.user("u3", Some(team), false).await;

        let pr = fx
            .service
            .create_pull_request("Tune alerts".to_string(), author)
            .await
            .unwrap();
        assert_eq!(pr.reviewers, vec![active]);
    }

    #[tokio::test]
    async fn test_create_without_team_has_no_reviewers() {
        let fx = Fixture::new();
        let author = fx.user("loner", None, true).await;

        let pr = fx
            .service
            .create_pull_request("Solo work".to_string(), author)
            .await
            .unwrap();
        assert!(pr.reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_author() {
        let fx = Fixture::new();
        let ghost = Uuid::new_v4();

        let err = fx
            .service
            .create_pull_request("Nope".to_string(), ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthorNotFound(id) if id == ghost));
        assert!(fx.service.list_pull_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reviewer_count_tracks_pool_size() {
        for active_teammates in 0..4usize {
            let fx = Fixture::new();
            let team = fx.team("sizes").await;
            let author = fx.user("author", Some(team), true).await;
            for i in 0..active_teammates {
                fx.user(&format!("mate{}", i), Some(team), true).await;
            }

            let pr = fx
                .service
                .create_pull_request("Sized".to_string(), author)
                .await
                .unwrap();
            assert_eq!(pr.reviewers.len(), active_teammates.min(MAX_REVIEWERS));
        }
    }

    #[tokio::test]
    async fn test_reassign_draws_from_remaining_pool() {
        let fx = Fixture::new();
        let team = fx.team("mobile").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;
        let u3 = fx.user("u3", Some(team), true).await;
        let u4 = fx.user("u4", Some(team), true).await;

        let pr = PullRequest::open("Dark mode".to_string(), author, vec![u2, u3]);
        fx.store.create_pull_request(&pr).await.unwrap();

        let result = fx.service.reassign_reviewer(pr.id, u2).await.unwrap();
        assert_eq!(result.new_reviewer_id, u4);
        assert_eq!(result.replaced_reviewer_id, u2);

        let reviewers: HashSet<Uuid> = result.pull_request.reviewers.iter().copied().collect();
        assert_eq!(reviewers, [u3, u4].into_iter().collect());
    }

    #[tokio::test]
    async fn test_reassign_with_empty_pool() {
        let fx = Fixture::new();
        let team = fx.team("tiny").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;

        let pr = PullRequest::open("Tiny".to_string(), author, vec![u2]);
        fx.store.create_pull_request(&pr).await.unwrap();
        let before = fx.store.snapshot().await;

        let err = fx.service.reassign_reviewer(pr.id, u2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCandidates);
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_reassign_unassigned_reviewer_changes_nothing() {
        let fx = Fixture::new();
        let team = fx.team("web").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;
        let outsider = fx.user("u3", Some(team), true).await;

        let pr = PullRequest::open("Landing page".to_string(), author, vec![u2]);
        fx.store.create_pull_request(&pr).await.unwrap();
        let before = fx.store.snapshot().await;

        let err = fx
            .service
            .reassign_reviewer(pr.id, outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReviewerNotAssigned { reviewer_id, .. } if reviewer_id == outsider));
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_reassign_on_merged_pull_request() {
        let fx = Fixture::new();
        let team = fx.team("data").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;
        fx.user("u3", Some(team), true).await;

        let pr = PullRequest::open("ETL".to_string(), author, vec![u2]);
        fx.store.create_pull_request(&pr).await.unwrap();
        fx.service.merge_pull_request(pr.id).await.unwrap();
        let before = fx.store.snapshot().await;

        let err = fx.service.reassign_reviewer(pr.id, u2).await.unwrap_err();
        assert!(matches!(err, AppError::PrMerged(id) if id == pr.id));
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_reassign_missing_pull_request() {
        let fx = Fixture::new();
        let err = fx
            .service
            .reassign_reviewer(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reassign_never_adds_author_or_duplicates() {
        let fx = Fixture::new();
        let team = fx.team("core").await;
        let author = fx.user("author", Some(team), true).await;
        let mut mates = Vec::new();
        for i in 0..5 {
            mates.push(fx.user(&format!("mate{}", i), Some(team), true).await);
        }

        let pr = fx
            .service
            .create_pull_request("Churn".to_string(), author)
            .await
            .unwrap();
        let mut current = pr.reviewers.clone();

        for _ in 0..10 {
            let old = current[0];
            let result = fx.service.reassign_reviewer(pr.id, old).await.unwrap();
            current = result.pull_request.reviewers.clone();

            assert_eq!(current.len(), 2);
            assert_ne!(current[0], current[1]);
            assert!(!current.contains(&author));
            assert!(!current.contains(&old));
        }
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let fx = Fixture::new();
        let author = fx.user("u1", None, true).await;
        let pr = fx
            .service
            .create_pull_request("Ship it".to_string(), author)
            .await
            .unwrap();

        let first = fx.service.merge_pull_request(pr.id).await.unwrap();
        let second = fx.service.merge_pull_request(pr.id).await.unwrap();

        assert_eq!(first.status, PrStatus::Merged);
        assert!(first.merged_at.is_some());
        assert_eq!(first.merged_at, second.merged_at);
        assert_eq!(first.reviewers, pr.reviewers);
    }

    #[tokio::test]
    async fn test_merge_missing_pull_request() {
        let fx = Fixture::new();
        let err = fx
            .service
            .merge_pull_request(Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let fx = Fixture::new();
        let author = fx.user("u1", None, true).await;
        let older = fx
            .service
            .create_pull_request("First".to_string(), author)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = fx
            .service
            .create_pull_request("Second".to_string(), author)
            .await
            .unwrap();

        let ids: Vec<Uuid> = fx
            .service
            .list_pull_requests()
            .await
            .unwrap()
            .into_iter()
            .map(|pr| pr.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_concurrent_reassign_and_merge() {
        let fx = Fixture::new();
        let team = fx.team("race").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;
        fx.user("u3", Some(team), true).await;

        let pr = PullRequest::open("Race".to_string(), author, vec![u2]);
        fx.store.create_pull_request(&pr).await.unwrap();

        let (reassigned, merged) = tokio::join!(
            fx.service.reassign_reviewer(pr.id, u2),
            fx.service.merge_pull_request(pr.id)
        );

        let merged = merged.unwrap();
        assert_eq!(merged.status, PrStatus::Merged);

        let final_state = fx.service.get_pull_request(pr.id).await.unwrap();
        assert_eq!(final_state.status, PrStatus::Merged);
        match reassigned {
            Ok(result) => assert_eq!(final_state.reviewers, vec![result.new_reviewer_id]),
            Err(err) => {
                assert!(matches!(err, AppError::PrMerged(_)));
                assert_eq!(final_state.reviewers, vec![u2]);
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_reassign_of_same_reviewer() {
        let fx = Fixture::new();
        let team = fx.team("double").await;
        let author = fx.user("u1", Some(team), true).await;
        let u2 = fx.user("u2", Some(team), true).await;
        fx.user("u3", Some(team), true).await;
        fx.user("u4", Some(team), true).await;

        let pr = PullRequest::open("Twice".to_string(), author, vec![u2]);
        fx.store.create_pull_request(&pr).await.unwrap();

        let (a, b) = tokio::join!(
            fx.service.reassign_reviewer(pr.id, u2),
            fx.service.reassign_reviewer(pr.id, u2)
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert!(successes >= 1);
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    AppError::ReviewerNotAssigned { .. } | AppError::Conflict(_)
                ));
            }
        }

        let final_state = fx.service.get_pull_request(pr.id).await.unwrap();
        assert_eq!(final_state.reviewers.len(), 1);
        assert!(!final_state.has_reviewer(u2));
    }
}

//! PostgreSQL pull request store

use super::{queries, violates};
use crate::error::{conflict_error, AppError};
use crate::models::{PrStatus, PullRequest};
use crate::store::{PullRequestStore, SwapOutcome};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use std::collections::HashMap;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use tracing::debug;
use uuid::Uuid;

pub struct PgPullRequestStore {
    pool: Pool,
}

impl PgPullRequestStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn pull_request_from_row(row: &Row) -> PullRequest {
    PullRequest {
        id: row.get(0),
        title: row.get(1),
        author_id: row.get(2),
        status: row.get(3),
        reviewers: Vec::new(),
        created_at: row.get(4),
        merged_at: row.get(5),
    }
}

/// Turn pull request rows into models, filling reviewers with one query
async fn with_reviewers(
    client: &tokio_postgres::Client,
    rows: Vec<Row>,
) -> Result<Vec<PullRequest>, AppError> {
    let mut prs: Vec<PullRequest> = rows.iter().map(pull_request_from_row).collect();
    if prs.is_empty() {
        return Ok(prs);
    }

    let ids: Vec<Uuid> = prs.iter().map(|pr| pr.id).collect();
    let mut reviewers: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in client.query(queries::GET_REVIEWERS_FOR, &[&ids]).await? {
        reviewers
            .entry(row.get(0))
            .or_default()
            .push(row.get(1));
    }

    for pr in &mut prs {
        pr.reviewers = reviewers.remove(&pr.id).unwrap_or_default();
    }
    Ok(prs)
}

#[async_trait]
impl PullRequestStore for PgPullRequestStore {
    async fn create_pull_request(&self, pr: &PullRequest) -> Result<(), AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        tx.execute(
            queries::INSERT_PULL_REQUEST,
            &[
                &pr.id,
                &pr.title,
                &pr.author_id,
                &pr.status,
                &pr.created_at,
                &pr.merged_at,
            ],
        )
        .await
        .map_err(|e| {
            if violates(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                AppError::AuthorNotFound(pr.author_id)
            } else if violates(&e, &SqlState::UNIQUE_VIOLATION) {
                conflict_error(format!("Pull request {} already exists", pr.id))
            } else {
                AppError::Database(e)
            }
        })?;

        for reviewer_id in &pr.reviewers {
            tx.execute(
                queries::INSERT_REVIEWER,
                &[&pr.id, reviewer_id, &pr.created_at],
            )
            .await
            .map_err(|e| {
                if violates(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    AppError::UserNotFound(*reviewer_id)
                } else {
                    AppError::Database(e)
                }
            })?;
        }

        tx.commit().await?;
        debug!("Stored pull request {} with {} reviewer(s)", pr.id, pr.reviewers.len());
        Ok(())
    }

    async fn get_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError> {
        let client = self.pool.get().await?;
        let rows: Vec<Row> = client
            .query_opt(queries::GET_PULL_REQUEST, &[&id])
            .await?
            .into_iter()
            .collect();
        Ok(with_reviewers(&**client, rows).await?.pop())
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::LIST_PULL_REQUESTS, &[]).await?;
        with_reviewers(&**client, rows).await
    }

    async fn list_pull_requests_by_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<PullRequest>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(queries::LIST_PULL_REQUESTS_BY_REVIEWER, &[&reviewer_id])
            .await?;
        with_reviewers(&**client, rows).await
    }

    async fn swap_reviewer(
        &self,
        pr_id: Uuid,
        old_reviewer: Uuid,
        new_reviewer: Uuid,
    ) -> Result<SwapOutcome, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // Dropping `tx` on any early return rolls back and releases the lock
        let Some(row) = tx.query_opt(queries::LOCK_PULL_REQUEST, &[&pr_id]).await? else {
            return Ok(SwapOutcome::PullRequestMissing);
        };
        let status: PrStatus = row.get(0);
        if status == PrStatus::Merged {
            return Ok(SwapOutcome::Merged);
        }

        let assigned: Vec<Uuid> = tx
            .query(queries::GET_REVIEWER_IDS, &[&pr_id])
            .await?
            .iter()
            .map(|row| row.get(0))
            .collect();
        if !assigned.contains(&old_reviewer) {
            return Ok(SwapOutcome::OldReviewerNotAssigned);
        }
        if assigned.contains(&new_reviewer) {
            return Ok(SwapOutcome::NewReviewerAlreadyAssigned);
        }

        tx.execute(queries::DELETE_REVIEWER, &[&pr_id, &old_reviewer])
            .await?;
        tx.execute(
            queries::INSERT_REVIEWER,
            &[&pr_id, &new_reviewer, &Utc::now()],
        )
        .await?;
        tx.commit().await?;

        Ok(SwapOutcome::Swapped)
    }

    async fn merge_pull_request(&self, id: Uuid) -> Result<Option<PullRequest>, AppError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(queries::MERGE_PULL_REQUEST, &[&id, &Utc::now()])
            .await?;
        if updated == 0 {
            debug!("Pull request {} was already merged or does not exist", id);
        }
        drop(client);

        self.get_pull_request(id).await
    }
}

//! PostgreSQL statistics store

use super::queries;
use crate::error::AppError;
use crate::models::{
    PullRequestAssignmentStats, ReviewStats, UserAssignmentStats, STATS_TOP_N,
};
use crate::store::StatisticsStore;
use async_trait::async_trait;
use deadpool_postgres::Pool;

pub struct PgStatisticsStore {
    pool: Pool,
}

impl PgStatisticsStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatisticsStore for PgStatisticsStore {
    async fn review_stats(&self) -> Result<ReviewStats, AppError> {
        let client = self.pool.get().await?;
        let limit = STATS_TOP_N as i64;

        let total_assignments: i64 = client
            .query_one(queries::COUNT_ASSIGNMENTS, &[])
            .await?
            .get(0);

        let assignments_by_user = client
            .query(queries::ASSIGNMENTS_BY_USER, &[&limit])
            .await?
            .iter()
            .map(|row| UserAssignmentStats {
                user_id: row.get(0),
                username: row.get(1),
                assignments: row.get::<_, i64>(2) as u64,
            })
            .collect();

        let assignments_by_pull_request = client
            .query(queries::ASSIGNMENTS_BY_PULL_REQUEST, &[&limit])
            .await?
            .iter()
            .map(|row| PullRequestAssignmentStats {
                pull_request_id: row.get(0),
                title: row.get(1),
                status: row.get(2),
                reviewers_count: row.get::<_, i64>(3) as u64,
            })
            .collect();

        let counts = client.query_one(queries::COUNT_PULL_REQUESTS, &[]).await?;
        let total: i64 = counts.get(0);
        let open: i64 = counts.get(1);
        let merged: i64 = counts.get(2);

        Ok(ReviewStats {
            total_assignments: total_assignments as u64,
            assignments_by_user,
            assignments_by_pull_request,
            total_pull_requests: total as u64,
            open_pull_requests: open as u64,
            merged_pull_requests: merged as u64,
            average_reviewers_per_pull_request: if total == 0 {
                0.0
            } else {
                total_assignments as f64 / total as f64
            },
        })
    }
}

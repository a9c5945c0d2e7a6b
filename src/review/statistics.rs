//! Assignment statistics

use crate::error::AppError;
use crate::models::ReviewStats;
use crate::store::StatisticsStore;
use std::sync::Arc;
use tracing::debug;

pub struct StatisticsService {
    store: Arc<dyn StatisticsStore>,
}

impl StatisticsService {
    pub fn new(store: Arc<dyn StatisticsStore>) -> Self {
        Self { store }
    }

    pub async fn get_statistics(&self) -> Result<ReviewStats, AppError> {
        let stats = self.store.review_stats().await?;
        debug!(
            "Computed statistics over {} pull request(s)",
            stats.total_pull_requests
        );
        Ok(stats)
    }
}

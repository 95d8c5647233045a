//! Fire-and-forget per-route access counters.

use std::sync::Arc;

use tracing::warn;

use crate::application::repos::{AccessCount, AccessRepo, RepoError};
use crate::cache::Clock;

#[derive(Clone)]
pub struct AccessTracker {
    repo: Arc<dyn AccessRepo>,
    clock: Arc<dyn Clock>,
}

impl AccessTracker {
    pub fn new(repo: Arc<dyn AccessRepo>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Count one access to `route` in the background. Failures are logged and dropped.
    pub fn track(&self, route: &'static str) {
        let repo = self.repo.clone();
        let at = self.clock.now();
        tokio::spawn(async move {
            if let Err(err) = repo.record_access(route, at).await {
                warn!(route, error = %err, "Failed to record llms.txt access");
            }
        });
    }

    pub async fn counts(&self) -> Result<Vec<AccessCount>, RepoError> {
        self.repo.list_access_counts().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use time::{OffsetDateTime, macros::datetime};

    use super::*;
    use crate::cache::ManualClock;
    use crate::infra::memory::MemoryAccessRepo;

    struct FailingRepo;

    #[async_trait]
    impl AccessRepo for FailingRepo {
        async fn record_access(&self, _route: &str, _at: OffsetDateTime) -> Result<(), RepoError> {
            Err(RepoError::Timeout)
        }

        async fn list_access_counts(&self) -> Result<Vec<AccessCount>, RepoError> {
            Ok(Vec::new())
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn counts_accesses_per_route() {
        let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 12:00 UTC)));
        let tracker = AccessTracker::new(Arc::new(MemoryAccessRepo::default()), clock.clone());

        tracker.track("index");
        tracker.track("index");
        settle().await;
        clock.advance(time::Duration::minutes(5));
        tracker.track("topic");
        settle().await;

        let counts = tracker.counts().await.expect("counts");
        assert_eq!(
            counts,
            vec![
                AccessCount {
                    route: "index".to_string(),
                    count: 2,
                    last_access_at: Some(datetime!(2024-06-01 12:00 UTC)),
                },
                AccessCount {
                    route: "topic".to_string(),
                    count: 1,
                    last_access_at: Some(datetime!(2024-06-01 12:05 UTC)),
                },
            ]
        );
    }

    #[tokio::test]
    async fn failures_are_contained() {
        let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 12:00 UTC)));
        let tracker = AccessTracker::new(Arc::new(FailingRepo), clock);

        tracker.track("full");
        settle().await;

        assert!(tracker.counts().await.expect("counts").is_empty());
    }
}

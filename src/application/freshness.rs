//! Staleness heuristic for the cached documents.
//!
//! The oracle keeps two self-expiring marks: when the content was last checked
//! and when the documents were last rebuilt. A check older than an hour, or any
//! topic or category mutation newer than it, means the documents must be
//! rebuilt.

use std::sync::{Arc, RwLock};

use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::application::repos::{ContentRepo, RepoError};
use crate::cache::{Clock, rw_read, rw_write};

const SOURCE: &str = "application::freshness";

/// A check older than this always triggers a rebuild.
pub const STALE_AFTER: Duration = Duration::hours(1);
/// Lifetime of the last-check mark.
pub const LAST_CHECK_TTL: Duration = Duration::hours(2);
/// Lifetime of the last-update mark.
pub const LAST_UPDATE_TTL: Duration = Duration::days(30);

#[derive(Debug, Clone, Copy)]
struct Mark {
    at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl Mark {
    fn new(at: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            at,
            expires_at: at + ttl,
        }
    }

    fn read(mark: Option<Mark>, now: OffsetDateTime) -> Option<OffsetDateTime> {
        mark.filter(|mark| now < mark.expires_at).map(|mark| mark.at)
    }
}

#[derive(Debug, Default)]
struct FreshnessMark {
    last_checked: Option<Mark>,
    last_updated: Option<Mark>,
}

pub struct FreshnessOracle {
    repo: Arc<dyn ContentRepo>,
    clock: Arc<dyn Clock>,
    marks: RwLock<FreshnessMark>,
}

impl FreshnessOracle {
    pub fn new(repo: Arc<dyn ContentRepo>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            marks: RwLock::new(FreshnessMark::default()),
        }
    }

    /// Whether the cached documents should be rebuilt now.
    pub async fn should_refresh(&self) -> Result<bool, RepoError> {
        let now = self.clock.now();
        let Some(last_checked) = self.last_checked_at() else {
            debug!("No recent content check recorded");
            return Ok(true);
        };

        if last_checked < now - STALE_AFTER {
            debug!(%last_checked, "Last content check is older than an hour");
            return Ok(true);
        }

        let activity = self.repo.content_activity().await?;
        Ok(activity.changed_since(last_checked))
    }

    /// Record a completed rebuild.
    pub fn mark_refreshed(&self) {
        let now = self.clock.now();
        let mut marks = rw_write(&self.marks, SOURCE, "mark_refreshed");
        marks.last_checked = Some(Mark::new(now, LAST_CHECK_TTL));
        marks.last_updated = Some(Mark::new(now, LAST_UPDATE_TTL));
    }

    /// Forget the last check so the next scheduled run rebuilds unconditionally.
    pub fn clear_last_check(&self) {
        rw_write(&self.marks, SOURCE, "clear_last_check").last_checked = None;
    }

    pub fn last_checked_at(&self) -> Option<OffsetDateTime> {
        let now = self.clock.now();
        Mark::read(rw_read(&self.marks, SOURCE, "last_checked_at").last_checked, now)
    }

    /// Time of the last rebuild, or now when none is recorded.
    pub fn last_update_time(&self) -> OffsetDateTime {
        let now = self.clock.now();
        Mark::read(rw_read(&self.marks, SOURCE, "last_update_time").last_updated, now)
            .unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::application::repos::TopicQuery;
    use crate::cache::ManualClock;
    use crate::domain::entities::{
        CategoryRecord, ContentActivity, PostRecord, TagRecord, TopicRecord,
    };

    struct ActivityRepo {
        activity: ContentActivity,
    }

    #[async_trait]
    impl ContentRepo for ActivityRepo {
        async fn list_public_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_category(&self, _id: i64) -> Result<Option<CategoryRecord>, RepoError> {
            Ok(None)
        }

        async fn find_category_by_slug(
            &self,
            _parent_id: Option<i64>,
            _slug: &str,
        ) -> Result<Option<CategoryRecord>, RepoError> {
            Ok(None)
        }

        async fn list_topics(&self, _query: &TopicQuery) -> Result<Vec<TopicRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_topic(&self, _id: i64) -> Result<Option<TopicRecord>, RepoError> {
            Ok(None)
        }

        async fn first_post_raws(
            &self,
            _topic_ids: &[i64],
        ) -> Result<Vec<(i64, String)>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_posts(&self, _topic_id: i64) -> Result<Vec<PostRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_tag(&self, _name: &str) -> Result<Option<TagRecord>, RepoError> {
            Ok(None)
        }

        async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn content_activity(&self) -> Result<ContentActivity, RepoError> {
            Ok(self.activity)
        }
    }

    fn oracle(activity: ContentActivity) -> (Arc<ManualClock>, FreshnessOracle) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 12:00 UTC)));
        let oracle = FreshnessOracle::new(Arc::new(ActivityRepo { activity }), clock.clone());
        (clock, oracle)
    }

    #[tokio::test]
    async fn refreshes_without_previous_check() {
        let (_clock, oracle) = oracle(ContentActivity::default());
        assert!(oracle.should_refresh().await.expect("activity"));
    }

    #[tokio::test]
    async fn skips_when_nothing_changed() {
        let (clock, oracle) = oracle(ContentActivity {
            latest_topic_created_at: Some(datetime!(2024-06-01 11:00 UTC)),
            latest_category_updated_at: None,
        });
        oracle.mark_refreshed();
        clock.advance(Duration::minutes(30));

        assert!(!oracle.should_refresh().await.expect("activity"));
    }

    #[tokio::test]
    async fn refreshes_after_newer_topic() {
        let (clock, oracle) = oracle(ContentActivity {
            latest_topic_created_at: Some(datetime!(2024-06-01 12:10 UTC)),
            latest_category_updated_at: None,
        });
        oracle.mark_refreshed();
        clock.advance(Duration::minutes(20));

        assert!(oracle.should_refresh().await.expect("activity"));
    }

    #[tokio::test]
    async fn refreshes_once_check_is_an_hour_old() {
        let (clock, oracle) = oracle(ContentActivity::default());
        oracle.mark_refreshed();
        clock.advance(Duration::minutes(61));

        assert!(oracle.should_refresh().await.expect("activity"));
    }

    #[tokio::test]
    async fn clearing_last_check_forces_refresh() {
        let (_clock, oracle) = oracle(ContentActivity::default());
        oracle.mark_refreshed();
        oracle.clear_last_check();

        assert!(oracle.last_checked_at().is_none());
        assert!(oracle.should_refresh().await.expect("activity"));
    }

    #[test]
    fn last_update_falls_back_to_now_and_expires() {
        let (clock, oracle) = oracle(ContentActivity::default());
        assert_eq!(oracle.last_update_time(), datetime!(2024-06-01 12:00 UTC));

        oracle.mark_refreshed();
        clock.advance(Duration::days(2));
        assert_eq!(oracle.last_update_time(), datetime!(2024-06-01 12:00 UTC));
        assert!(oracle.last_checked_at().is_none());

        clock.advance(Duration::days(30));
        assert_eq!(oracle.last_update_time(), clock.now());
    }
}

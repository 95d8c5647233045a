//! Repository traits describing the read-only content adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{
    CategoryRecord, ContentActivity, PostRecord, TagRecord, TopicRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Topic selection shared by every list the generator renders.
///
/// Every query is implicitly restricted to visible, non-deleted topics of the
/// regular archetype and ordered by creation time, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicQuery {
    pub category_id: Option<i64>,
    pub tag: Option<String>,
    /// Require a category that is not read-restricted (drops uncategorized topics).
    pub public_category_only: bool,
    pub min_views: Option<i64>,
    pub limit: Option<u32>,
}

impl TopicQuery {
    pub fn in_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn public() -> Self {
        Self {
            public_category_only: true,
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_min_views(mut self, min_views: i64) -> Self {
        self.min_views = Some(min_views);
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Row-level predicate equivalent to the SQL adapter's WHERE clause, minus
    /// the tag join which needs membership data.
    pub fn matches(&self, topic: &TopicRecord) -> bool {
        if !topic.visible || topic.deleted || !topic.is_regular() {
            return false;
        }
        if self.public_category_only && !topic.in_public_category() {
            return false;
        }
        if let Some(category_id) = self.category_id
            && topic.category.as_ref().map(|c| c.id) != Some(category_id)
        {
            return false;
        }
        if let Some(min_views) = self.min_views
            && topic.views < min_views
        {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Every category that is not read-restricted, ordered by position then id.
    async fn list_public_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;

    /// Look up a category by slug beneath `parent_id` (`None` for top level).
    async fn find_category_by_slug(
        &self,
        parent_id: Option<i64>,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError>;

    async fn list_topics(&self, query: &TopicQuery) -> Result<Vec<TopicRecord>, RepoError>;

    async fn find_topic(&self, id: i64) -> Result<Option<TopicRecord>, RepoError>;

    /// Raw body of each topic's first post, keyed by topic id.
    async fn first_post_raws(&self, topic_ids: &[i64]) -> Result<Vec<(i64, String)>, RepoError>;

    /// Non-hidden, non-deleted posts of a topic in ascending post number.
    async fn list_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_tag(&self, name: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;

    async fn content_activity(&self) -> Result<ContentActivity, RepoError>;
}

/// A single per-route access counter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AccessCount {
    pub route: String,
    pub count: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_access_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait AccessRepo: Send + Sync {
    async fn record_access(&self, route: &str, at: OffsetDateTime) -> Result<(), RepoError>;

    async fn list_access_counts(&self) -> Result<Vec<AccessCount>, RepoError>;
}

//! JSON forum export backing the content repository without a database.
//!
//! The export mirrors the host tables the generator reads. It is used for
//! offline rendering and as the fixture source in tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{ContentRepo, RepoError, TopicQuery};
use crate::domain::entities::{
    CategoryRecord, ContentActivity, PostRecord, TagRecord, TopicCategory, TopicRecord,
};
use crate::domain::types::Archetype;

use super::error::InfraError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumExport {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub topics: Vec<ExportTopic>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

/// Topic row as stored in the export; the category is referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTopic {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub archetype: Archetype,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_posts_count")]
    pub posts_count: i64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Tag names attached to the topic.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_posts_count() -> i64 {
    1
}

fn default_visible() -> bool {
    true
}

impl ForumExport {
    pub fn from_json(bytes: &[u8]) -> Result<Self, InfraError> {
        let export: ForumExport =
            serde_json::from_slice(bytes).map_err(|err| InfraError::export(err.to_string()))?;
        export.validate()?;
        Ok(export)
    }

    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let bytes = tokio::fs::read(path).await?;
        let export = Self::from_json(&bytes)?;
        info!(
            path = %path.display(),
            categories = export.categories.len(),
            topics = export.topics.len(),
            posts = export.posts.len(),
            tags = export.tags.len(),
            "Loaded forum export"
        );
        Ok(export)
    }

    fn validate(&self) -> Result<(), InfraError> {
        let category_ids: HashSet<i64> = self.categories.iter().map(|c| c.id).collect();
        if category_ids.len() != self.categories.len() {
            return Err(InfraError::export("duplicate category id"));
        }

        for category in &self.categories {
            if let Some(parent) = category.parent_category_id
                && !category_ids.contains(&parent)
            {
                return Err(InfraError::export(format!(
                    "category {} references unknown parent {parent}",
                    category.id
                )));
            }
        }

        let topic_ids: HashSet<i64> = self.topics.iter().map(|t| t.id).collect();
        if topic_ids.len() != self.topics.len() {
            return Err(InfraError::export("duplicate topic id"));
        }

        for topic in &self.topics {
            if let Some(category_id) = topic.category_id
                && !category_ids.contains(&category_id)
            {
                return Err(InfraError::export(format!(
                    "topic {} references unknown category {category_id}",
                    topic.id
                )));
            }
        }

        if let Some(post) = self.posts.iter().find(|p| !topic_ids.contains(&p.topic_id)) {
            return Err(InfraError::export(format!(
                "post {} references unknown topic {}",
                post.id, post.topic_id
            )));
        }

        Ok(())
    }
}

/// Read-only repository over a loaded [`ForumExport`].
pub struct ExportRepository {
    export: ForumExport,
    categories_by_id: HashMap<i64, usize>,
}

impl ExportRepository {
    pub fn new(export: ForumExport) -> Self {
        let categories_by_id = export
            .categories
            .iter()
            .enumerate()
            .map(|(index, category)| (category.id, index))
            .collect();

        Self {
            export,
            categories_by_id,
        }
    }

    pub async fn open(path: &Path) -> Result<Self, InfraError> {
        Ok(Self::new(ForumExport::load(path).await?))
    }

    fn category(&self, id: i64) -> Option<&CategoryRecord> {
        self.categories_by_id
            .get(&id)
            .map(|index| &self.export.categories[*index])
    }

    fn topic_record(&self, topic: &ExportTopic) -> TopicRecord {
        TopicRecord {
            id: topic.id,
            title: topic.title.clone(),
            slug: topic.slug.clone(),
            category: topic
                .category_id
                .and_then(|id| self.category(id))
                .map(TopicCategory::from),
            archetype: topic.archetype,
            views: topic.views,
            posts_count: topic.posts_count,
            visible: topic.visible,
            deleted: topic.deleted,
            created_at: topic.created_at,
        }
    }
}

#[async_trait]
impl ContentRepo for ExportRepository {
    async fn list_public_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let mut categories: Vec<CategoryRecord> = self
            .export
            .categories
            .iter()
            .filter(|category| category.is_public())
            .cloned()
            .collect();
        categories.sort_by_key(|category| (category.position, category.id));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.category(id).cloned())
    }

    async fn find_category_by_slug(
        &self,
        parent_id: Option<i64>,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self
            .export
            .categories
            .iter()
            .find(|category| {
                category.parent_category_id == parent_id && category.slug.eq_ignore_ascii_case(slug)
            })
            .cloned())
    }

    async fn list_topics(&self, query: &TopicQuery) -> Result<Vec<TopicRecord>, RepoError> {
        let mut topics: Vec<TopicRecord> = self
            .export
            .topics
            .iter()
            .filter(|topic| match query.tag.as_deref() {
                Some(tag) => topic.tags.iter().any(|name| name.eq_ignore_ascii_case(tag)),
                None => true,
            })
            .map(|topic| self.topic_record(topic))
            .filter(|topic| query.matches(topic))
            .collect();

        topics.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = query.limit {
            topics.truncate(limit as usize);
        }
        Ok(topics)
    }

    async fn find_topic(&self, id: i64) -> Result<Option<TopicRecord>, RepoError> {
        Ok(self
            .export
            .topics
            .iter()
            .find(|topic| topic.id == id)
            .map(|topic| self.topic_record(topic)))
    }

    async fn first_post_raws(&self, topic_ids: &[i64]) -> Result<Vec<(i64, String)>, RepoError> {
        let wanted: HashSet<i64> = topic_ids.iter().copied().collect();
        Ok(self
            .export
            .posts
            .iter()
            .filter(|post| post.post_number == 1 && !post.deleted && wanted.contains(&post.topic_id))
            .map(|post| (post.topic_id, post.raw.clone()))
            .collect())
    }

    async fn list_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<PostRecord> = self
            .export
            .posts
            .iter()
            .filter(|post| post.topic_id == topic_id && post.is_renderable())
            .cloned()
            .collect();
        posts.sort_by_key(|post| post.post_number);
        Ok(posts)
    }

    async fn find_tag(&self, name: &str) -> Result<Option<TagRecord>, RepoError> {
        Ok(self
            .export
            .tags
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.export.tags.clone();
        tags.sort_by_key(|tag| tag.id);
        Ok(tags)
    }

    async fn content_activity(&self) -> Result<ContentActivity, RepoError> {
        Ok(ContentActivity {
            latest_topic_created_at: self
                .export
                .topics
                .iter()
                .filter(|topic| !topic.deleted)
                .map(|topic| topic.created_at)
                .max(),
            latest_category_updated_at: self
                .export
                .categories
                .iter()
                .map(|category| category.updated_at)
                .max(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {"id": 1, "name": "General", "slug": "general", "position": 2,
             "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "name": "Staff", "slug": "staff", "read_restricted": true, "position": 1,
             "updated_at": "2024-02-01T00:00:00Z"}
        ],
        "topics": [
            {"id": 10, "title": "Old", "slug": "old", "category_id": 1, "views": 3,
             "posts_count": 2, "created_at": "2024-01-02T00:00:00Z", "tags": ["rust"]},
            {"id": 11, "title": "New", "slug": "new", "category_id": 1, "views": 30,
             "created_at": "2024-03-02T00:00:00Z"},
            {"id": 12, "title": "Secret", "slug": "secret", "category_id": 2,
             "created_at": "2024-03-05T00:00:00Z", "tags": ["rust"]}
        ],
        "posts": [
            {"id": 100, "topic_id": 10, "post_number": 2, "author": "bob", "raw": "reply"},
            {"id": 101, "topic_id": 10, "post_number": 1, "author": "ann", "raw": "opening"},
            {"id": 102, "topic_id": 10, "post_number": 3, "raw": "gone", "hidden": true}
        ],
        "tags": [{"id": 5, "name": "rust"}]
    }"#;

    fn repo() -> ExportRepository {
        ExportRepository::new(ForumExport::from_json(SAMPLE.as_bytes()).expect("valid export"))
    }

    #[tokio::test]
    async fn public_categories_exclude_restricted() {
        let categories = repo().list_public_categories().await.expect("categories");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "general");
    }

    #[tokio::test]
    async fn topics_are_newest_first() {
        let topics = repo().list_topics(&TopicQuery::public()).await.expect("topics");
        let ids: Vec<i64> = topics.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![11, 10]);
    }

    #[tokio::test]
    async fn tag_filter_respects_category_visibility() {
        let topics = repo()
            .list_topics(&TopicQuery::public().with_tag("RUST"))
            .await
            .expect("topics");
        let ids: Vec<i64> = topics.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[tokio::test]
    async fn posts_skip_hidden_and_sort_by_number() {
        let posts = repo().list_posts(10).await.expect("posts");
        let numbers: Vec<i32> = posts.iter().map(|p| p.post_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn activity_reports_newest_timestamps() {
        let activity = repo().content_activity().await.expect("activity");
        assert_eq!(
            activity.latest_topic_created_at,
            Some(time::macros::datetime!(2024-03-05 00:00 UTC))
        );
        assert_eq!(
            activity.latest_category_updated_at,
            Some(time::macros::datetime!(2024-02-01 00:00 UTC))
        );
    }

    #[test]
    fn rejects_posts_for_unknown_topics() {
        let json = r#"{"posts": [{"id": 1, "topic_id": 9, "post_number": 1, "raw": "x"}]}"#;
        let err = ForumExport::from_json(json.as_bytes()).expect_err("dangling post");
        assert!(matches!(err, InfraError::Export { .. }));
    }
}

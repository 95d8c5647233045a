//! Forum entities read from the host platform.
//!
//! These mirror the host's tables closely enough to render documents; the
//! generator never writes them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::Archetype;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Cooked description as stored by the host; may contain HTML.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_category_id: Option<i64>,
    #[serde(default)]
    pub read_restricted: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CategoryRecord {
    pub fn is_public(&self) -> bool {
        !self.read_restricted
    }

    pub fn is_root(&self) -> bool {
        self.parent_category_id.is_none()
    }
}

/// The slice of a category a topic carries with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub read_restricted: bool,
}

impl From<&CategoryRecord> for TopicCategory {
    fn from(category: &CategoryRecord) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            read_restricted: category.read_restricted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: Option<TopicCategory>,
    pub archetype: Archetype,
    pub views: i64,
    pub posts_count: i64,
    pub visible: bool,
    pub deleted: bool,
    pub created_at: OffsetDateTime,
}

impl TopicRecord {
    /// Replies exclude the opening post.
    pub fn reply_count(&self) -> i64 {
        (self.posts_count - 1).max(0)
    }

    pub fn is_regular(&self) -> bool {
        self.archetype == Archetype::Regular
    }

    pub fn in_public_category(&self) -> bool {
        self.category
            .as_ref()
            .is_some_and(|category| !category.read_restricted)
    }

    /// Whether an anonymous visitor may read the topic.
    pub fn is_publicly_visible(&self) -> bool {
        self.visible
            && !self.deleted
            && self.archetype != Archetype::PrivateMessage
            && self
                .category
                .as_ref()
                .is_none_or(|category| !category.read_restricted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub topic_id: i64,
    /// `None` once the author account has been deleted.
    #[serde(default)]
    pub author: Option<String>,
    pub post_number: i32,
    pub raw: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl PostRecord {
    pub fn is_renderable(&self) -> bool {
        !self.hidden && !self.deleted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
}

/// Newest mutation timestamps used by the freshness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentActivity {
    pub latest_topic_created_at: Option<OffsetDateTime>,
    pub latest_category_updated_at: Option<OffsetDateTime>,
}

impl ContentActivity {
    pub fn changed_since(&self, instant: OffsetDateTime) -> bool {
        self.latest_topic_created_at.is_some_and(|at| at > instant)
            || self.latest_category_updated_at.is_some_and(|at| at > instant)
    }
}

//! Document composition.
//!
//! Every document is a pure function of the forum content visible through a
//! [`ContentRepo`] and a [`ConfigSnapshot`]. Builders never consult the cache;
//! memoization is the caller's concern.

mod entities;
mod full;
mod navigation;
mod sitemap;

use std::fmt;

use time::OffsetDateTime;

use crate::application::format::Links;
use crate::application::repos::{ContentRepo, RepoError};
use crate::application::settings::ConfigSnapshot;
use crate::cache::CacheKey;
use crate::domain::entities::{CategoryRecord, TagRecord, TopicRecord};

/// Cap on topics listed by the category and tag documents.
pub const ENTITY_TOPIC_LIMIT: u32 = 100;

/// Ancestor levels followed before a category chain is treated as cyclic.
pub const MAX_CATEGORY_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Navigation,
    FullContent,
    Sitemap,
    Category,
    Topic,
    Tag,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Navigation => "navigation",
            DocumentKind::FullContent => "full",
            DocumentKind::Sitemap => "sitemap",
            DocumentKind::Category => "category",
            DocumentKind::Topic => "topic",
            DocumentKind::Tag => "tag",
        }
    }

    /// Access-counter key of the route serving this document.
    pub fn route_key(self) -> &'static str {
        match self {
            DocumentKind::Navigation => "index",
            DocumentKind::FullContent => "full",
            DocumentKind::Sitemap => "sitemaps",
            DocumentKind::Category => "category",
            DocumentKind::Topic => "topic",
            DocumentKind::Tag => "tag",
        }
    }

    /// Cache slot for site-wide documents; entity documents are never cached.
    pub fn cache_key(self) -> Option<CacheKey> {
        match self {
            DocumentKind::Navigation => Some(CacheKey::Navigation),
            DocumentKind::FullContent => Some(CacheKey::FullContent),
            DocumentKind::Sitemap => Some(CacheKey::Sitemap),
            DocumentKind::Category | DocumentKind::Topic | DocumentKind::Tag => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A build request; entity variants carry an already resolved, visible entity.
#[derive(Debug, Clone, Copy)]
pub enum DocumentRequest<'r> {
    Navigation,
    FullContent,
    Sitemap,
    Category(&'r CategoryRecord),
    Topic(&'r TopicRecord),
    Tag(&'r TagRecord),
}

impl DocumentRequest<'_> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentRequest::Navigation => DocumentKind::Navigation,
            DocumentRequest::FullContent => DocumentKind::FullContent,
            DocumentRequest::Sitemap => DocumentKind::Sitemap,
            DocumentRequest::Category(_) => DocumentKind::Category,
            DocumentRequest::Topic(_) => DocumentKind::Topic,
            DocumentRequest::Tag(_) => DocumentKind::Tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub body: String,
    pub generated_at: OffsetDateTime,
}

pub struct DocumentBuilder<'a> {
    repo: &'a dyn ContentRepo,
    config: &'a ConfigSnapshot,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(repo: &'a dyn ContentRepo, config: &'a ConfigSnapshot) -> Self {
        Self { repo, config }
    }

    pub async fn build(&self, request: DocumentRequest<'_>) -> Result<String, RepoError> {
        match request {
            DocumentRequest::Navigation => self.navigation().await,
            DocumentRequest::FullContent => self.full_content().await,
            DocumentRequest::Sitemap => self.sitemap().await,
            DocumentRequest::Category(category) => self.category(category).await,
            DocumentRequest::Topic(topic) => self.topic(topic).await,
            DocumentRequest::Tag(tag) => self.tag(tag).await,
        }
    }

    fn links(&self) -> Links<'a> {
        Links::new(&self.config.base_url)
    }
}

/// Public root categories in position order, each with its public children.
pub(crate) struct CategoryTree<'c> {
    pub roots: Vec<(&'c CategoryRecord, Vec<&'c CategoryRecord>)>,
}

impl<'c> CategoryTree<'c> {
    /// `categories` must already be restricted to public ones and ordered by position.
    pub fn new(categories: &'c [CategoryRecord]) -> Self {
        let roots = categories
            .iter()
            .filter(|category| category.is_root())
            .map(|root| {
                let children = children_of(categories, root.id);
                (root, children)
            })
            .collect();
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

pub(crate) fn children_of(categories: &[CategoryRecord], parent_id: i64) -> Vec<&CategoryRecord> {
    categories
        .iter()
        .filter(|category| category.parent_category_id == Some(parent_id) && category.is_public())
        .collect()
}

/// Trailing canonical block shared by entity documents.
pub(crate) fn entity_footer(url: &str) -> String {
    format!("\n**Canonical:** {url}\n**Original content:** {url}\n")
}

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_routes_and_cache_slots() {
        assert_eq!(DocumentKind::Navigation.route_key(), "index");
        assert_eq!(DocumentKind::Sitemap.route_key(), "sitemaps");
        assert_eq!(
            DocumentKind::FullContent.cache_key(),
            Some(CacheKey::FullContent)
        );
        assert_eq!(DocumentKind::Topic.cache_key(), None);
    }

    #[test]
    fn footer_repeats_canonical_url() {
        assert_eq!(
            entity_footer("https://f.example/t/a/1"),
            "\n**Canonical:** https://f.example/t/a/1\n**Original content:** https://f.example/t/a/1\n"
        );
    }
}

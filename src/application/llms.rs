//! The llms.txt service: gates, entity resolution, cached generation and the
//! scheduled freshness refresh.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::documents::{
    DocumentBuilder, DocumentRequest, GeneratedDocument, MAX_CATEGORY_DEPTH,
};
use crate::application::error::LlmsError;
use crate::application::format::Links;
use crate::application::freshness::FreshnessOracle;
use crate::application::repos::{ContentRepo, RepoError};
use crate::application::settings::ConfigSnapshot;
use crate::cache::{CacheConfig, CacheKey, DOCUMENT_KEYS, DocumentCache};
use crate::domain::entities::{CategoryRecord, TagRecord, TopicRecord};

const METRIC_GENERATE_MS: &str = "llms_txt_generate_ms";
const METRIC_REFRESH: &str = "llms_txt_refresh_total";

/// An entity document together with the page it mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDocument {
    pub document: GeneratedDocument,
    pub canonical_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Skipped,
}

impl RefreshOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed => "refreshed",
            RefreshOutcome::Skipped => "skipped",
        }
    }
}

pub struct LlmsService {
    repo: Arc<dyn ContentRepo>,
    cache: Arc<DocumentCache>,
    freshness: Arc<FreshnessOracle>,
    config: Arc<ConfigSnapshot>,
    cache_config: CacheConfig,
}

impl LlmsService {
    pub fn new(
        repo: Arc<dyn ContentRepo>,
        cache: Arc<DocumentCache>,
        freshness: Arc<FreshnessOracle>,
        config: Arc<ConfigSnapshot>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            freshness,
            config,
            cache_config,
        }
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }


    /// Feature and indexing gates, checked before any lookup or generation.
    pub fn ensure_available(&self) -> Result<(), LlmsError> {
        if !self.config.enabled {
            return Err(LlmsError::FeatureDisabled);
        }
        if !self.config.allow_indexing {
            return Err(LlmsError::IndexingForbidden);
        }
        Ok(())
    }

    pub async fn navigation(&self) -> Result<GeneratedDocument, LlmsError> {
        Ok(self.generate(DocumentRequest::Navigation).await?)
    }

    pub async fn full_content(&self) -> Result<GeneratedDocument, LlmsError> {
        Ok(self.generate(DocumentRequest::FullContent).await?)
    }

    pub async fn sitemap(&self) -> Result<GeneratedDocument, LlmsError> {
        Ok(self.generate(DocumentRequest::Sitemap).await?)
    }

    /// Category document for a `slug[/slug…][/id]` path.
    pub async fn category(&self, path: &str) -> Result<EntityDocument, LlmsError> {
        let category = self.resolve_category(path).await?;
        let canonical_url = self.links().category_url(&category);
        let document = self.generate(DocumentRequest::Category(&category)).await?;
        Ok(EntityDocument {
            document,
            canonical_url,
        })
    }

    pub async fn topic(&self, id: i64) -> Result<EntityDocument, LlmsError> {
        let topic = self.resolve_topic(id).await?;
        let canonical_url = self.links().topic_url(&topic);
        let document = self.generate(DocumentRequest::Topic(&topic)).await?;
        Ok(EntityDocument {
            document,
            canonical_url,
        })
    }

    pub async fn tag(&self, name: &str) -> Result<EntityDocument, LlmsError> {
        let tag = self.resolve_tag(name).await?;
        let canonical_url = self.links().tag_url(&tag);
        let document = self.generate(DocumentRequest::Tag(&tag)).await?;
        Ok(EntityDocument {
            document,
            canonical_url,
        })
    }

    /// Resolve a category path. A numeric last segment selects by id; otherwise
    /// the slugs are walked from the top level down.
    pub async fn resolve_category(&self, path: &str) -> Result<CategoryRecord, LlmsError> {
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        if segments.is_empty() || segments.len() > MAX_CATEGORY_DEPTH + 2 {
            return Err(LlmsError::NotFound);
        }

        let found = match segments.last().and_then(|segment| segment.parse::<i64>().ok()) {
            Some(id) => self.repo.find_category(id).await?,
            None => {
                let mut current: Option<CategoryRecord> = None;
                for slug in &segments {
                    let parent_id = current.as_ref().map(|category| category.id);
                    match self.repo.find_category_by_slug(parent_id, slug).await? {
                        Some(category) => current = Some(category),
                        None => return Err(LlmsError::NotFound),
                    }
                }
                current
            }
        };

        found
            .filter(CategoryRecord::is_public)
            .ok_or(LlmsError::NotFound)
    }

    pub async fn resolve_topic(&self, id: i64) -> Result<TopicRecord, LlmsError> {
        self.repo
            .find_topic(id)
            .await?
            .filter(TopicRecord::is_publicly_visible)
            .ok_or(LlmsError::NotFound)
    }

    pub async fn resolve_tag(&self, name: &str) -> Result<TagRecord, LlmsError> {
        if !self.config.tagging_enabled {
            return Err(LlmsError::NotFound);
        }
        self.repo.find_tag(name).await?.ok_or(LlmsError::NotFound)
    }

    /// Scheduled catch-up: rebuild when the oracle reports stale content.
    pub async fn refresh_if_stale(&self) -> Result<RefreshOutcome, RepoError> {
        let outcome = if self.freshness.should_refresh().await? {
            self.cache.invalidate_all(&DOCUMENT_KEYS);
            self.generate(DocumentRequest::Navigation).await?;
            self.freshness.mark_refreshed();
            info!("Navigation document rebuilt");
            RefreshOutcome::Refreshed
        } else {
            debug!("Cached documents are fresh");
            RefreshOutcome::Skipped
        };

        counter!(METRIC_REFRESH, "outcome" => outcome.as_str()).increment(1);
        Ok(outcome)
    }

    pub fn last_update_time(&self) -> OffsetDateTime {
        self.freshness.last_update_time()
    }

    pub fn cached_keys(&self) -> Vec<CacheKey> {
        self.cache.cached_keys()
    }

    fn links(&self) -> Links<'_> {
        Links::new(&self.config.base_url)
    }

    async fn generate(&self, request: DocumentRequest<'_>) -> Result<GeneratedDocument, RepoError> {
        let kind = request.kind();
        let started = Instant::now();
        let builder = DocumentBuilder::new(self.repo.as_ref(), &self.config);

        let body = match kind.cache_key() {
            Some(key) => {
                self.cache
                    .fetch(key, self.cache_config.ttl, || builder.build(request))
                    .await?
            }
            None => builder.build(request).await?,
        };

        histogram!(METRIC_GENERATE_MS, "kind" => kind.as_str())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(GeneratedDocument {
            kind,
            body,
            generated_at: self.cache.clock().now(),
        })
    }
}

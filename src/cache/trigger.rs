//! Cache trigger service.
//!
//! Turns content-mutation events into document invalidation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::freshness::FreshnessOracle;

use super::events::ContentEvent;
use super::keys::DOCUMENT_KEYS;
use super::store::DocumentCache;

pub struct CacheTrigger {
    enabled: bool,
    cache: Arc<DocumentCache>,
    freshness: Arc<FreshnessOracle>,
}

impl CacheTrigger {
    /// `enabled` mirrors the generator's feature flag; a disabled generator ignores events.
    pub fn new(enabled: bool, cache: Arc<DocumentCache>, freshness: Arc<FreshnessOracle>) -> Self {
        Self {
            enabled,
            cache,
            freshness,
        }
    }

    /// Drop every cached document and the last-check mark. Returns whether anything ran.
    pub fn content_changed(&self, event: ContentEvent) -> bool {
        if !self.enabled {
            debug!(event = %event, "Cache trigger skipped: generator disabled");
            return false;
        }

        self.cache.invalidate_all(&DOCUMENT_KEYS);
        self.freshness.clear_last_check();

        info!(event = %event, "Cached documents invalidated");
        true
    }
}

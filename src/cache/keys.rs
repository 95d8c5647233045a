//! Cache key definitions.

use std::fmt;

/// Documents memoized by the cache. Entity documents are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Navigation,
    FullContent,
    Sitemap,
}

/// Every cached document; invalidated together on content mutation.
pub const DOCUMENT_KEYS: [CacheKey; 3] =
    [CacheKey::Navigation, CacheKey::FullContent, CacheKey::Sitemap];

impl CacheKey {
    /// Stable identifier used in logs, metrics labels and the status report.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Navigation => "llms_txt_navigation",
            CacheKey::FullContent => "llms_txt_full_content",
            CacheKey::Sitemap => "llms_txt_sitemaps",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

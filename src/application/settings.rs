//! Immutable generator configuration handed to every build.

use crate::config::Settings;
use crate::domain::types::PostsLimit;

/// Upper bound on the navigation document's latest-topics list.
pub const MAX_LATEST_TOPICS: u32 = 50;

/// Informational links listed under "Additional Resources".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLinks {
    pub about_url: Option<String>,
    pub faq_url: Option<String>,
    pub tos_url: Option<String>,
    pub privacy_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub base_url: String,
    pub site_title: String,
    pub site_description: String,
    pub intro_text: String,
    pub full_description: String,
    pub latest_topics_count: u32,
    pub posts_limit: PostsLimit,
    pub min_views: i64,
    pub include_excerpts: bool,
    pub excerpt_length: usize,
    pub tagging_enabled: bool,
    pub links: ResourceLinks,
    pub enabled: bool,
    pub allow_indexing: bool,
}

impl ConfigSnapshot {
    /// Latest-topics length after clamping.
    pub fn latest_topics_limit(&self) -> u32 {
        self.latest_topics_count.min(MAX_LATEST_TOPICS)
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            site_title: "Forum".to_string(),
            site_description: String::new(),
            intro_text: String::new(),
            full_description: String::new(),
            latest_topics_count: 20,
            posts_limit: PostsLimit::Medium,
            min_views: 0,
            include_excerpts: true,
            excerpt_length: 500,
            tagging_enabled: true,
            links: ResourceLinks::default(),
            enabled: true,
            allow_indexing: true,
        }
    }
}

impl From<&Settings> for ConfigSnapshot {
    fn from(settings: &Settings) -> Self {
        let site = &settings.site;
        let llms = &settings.llms;

        Self {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            site_title: site.title.clone(),
            site_description: site.description.clone(),
            intro_text: llms.intro_text.clone(),
            full_description: llms.full_description.clone(),
            latest_topics_count: llms.latest_topics_count,
            posts_limit: llms.posts_limit,
            min_views: i64::from(llms.min_views),
            include_excerpts: llms.include_excerpts,
            excerpt_length: llms.excerpt_length.get() as usize,
            tagging_enabled: site.tagging_enabled,
            links: ResourceLinks {
                about_url: site.about_url.clone(),
                faq_url: site.faq_url.clone(),
                tos_url: site.tos_url.clone(),
                privacy_url: site.privacy_url.clone(),
            },
            enabled: llms.enabled,
            allow_indexing: llms.allow_indexing,
        }
    }
}

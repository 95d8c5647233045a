//! Shared domain enumerations aligned with the host forum's stored values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Topic classification as stored by the forum (`topics.archetype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    #[default]
    Regular,
    PrivateMessage,
    Banner,
    #[serde(other)]
    Other,
}

impl Archetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Regular => "regular",
            Archetype::PrivateMessage => "private_message",
            Archetype::Banner => "banner",
            Archetype::Other => "other",
        }
    }

    /// Unknown archetypes collapse into [`Archetype::Other`].
    pub fn from_db(value: &str) -> Self {
        match value {
            "regular" => Archetype::Regular,
            "private_message" => Archetype::PrivateMessage,
            "banner" => Archetype::Banner,
            _ => Archetype::Other,
        }
    }
}

/// Cap on the number of topics surfaced by the full-content and sitemap documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostsLimit {
    Small,
    #[default]
    Medium,
    Large,
    All,
}

/// Sitemap ceiling applied when the tier is unlimited.
pub const SITEMAP_UNLIMITED_TOPIC_CAP: u32 = 5000;

impl PostsLimit {
    /// Topic cap for the tier; `None` means unlimited.
    pub fn topic_cap(self) -> Option<u32> {
        match self {
            PostsLimit::Small => Some(500),
            PostsLimit::Medium => Some(2500),
            PostsLimit::Large => Some(5000),
            PostsLimit::All => None,
        }
    }

    pub fn sitemap_cap(self) -> u32 {
        self.topic_cap().unwrap_or(SITEMAP_UNLIMITED_TOPIC_CAP)
    }

    /// Lenient parse: unrecognised tiers fall back to [`PostsLimit::Medium`].
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for PostsLimit {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(PostsLimit::Small),
            "medium" => Ok(PostsLimit::Medium),
            "large" => Ok(PostsLimit::Large),
            "all" => Ok(PostsLimit::All),
            _ => Err(()),
        }
    }
}

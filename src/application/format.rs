//! Text fragments shared by every generated document.
//!
//! All functions here are pure and total: any well-formed entity produces a
//! fragment, never an error.

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

use crate::domain::entities::{CategoryRecord, TagRecord, TopicCategory, TopicRecord};

pub const NO_DESCRIPTION: &str = "No description";
pub const OMISSION: &str = "...";

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

/// Minimal view of a category needed to link to it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRef<'a> {
    pub id: i64,
    pub name: &'a str,
    pub slug: &'a str,
}

impl<'a> From<&'a CategoryRecord> for CategoryRef<'a> {
    fn from(category: &'a CategoryRecord) -> Self {
        Self {
            id: category.id,
            name: &category.name,
            slug: &category.slug,
        }
    }
}

impl<'a> From<&'a TopicCategory> for CategoryRef<'a> {
    fn from(category: &'a TopicCategory) -> Self {
        Self {
            id: category.id,
            name: &category.name,
            slug: &category.slug,
        }
    }
}

/// Absolute URL construction against the forum's public base URL.
#[derive(Debug, Clone, Copy)]
pub struct Links<'a> {
    base: &'a str,
}

impl<'a> Links<'a> {
    pub fn new(base: &'a str) -> Self {
        Self {
            base: base.trim_end_matches('/'),
        }
    }

    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn category_url<'c>(&self, category: impl Into<CategoryRef<'c>>) -> String {
        let category = category.into();
        format!("{}/c/{}/{}", self.base, url_encode(category.slug), category.id)
    }

    pub fn topic_url(&self, topic: &TopicRecord) -> String {
        format!("{}/t/{}/{}", self.base, url_encode(&topic.slug), topic.id)
    }

    pub fn tag_url(&self, tag: &TagRecord) -> String {
        format!("{}/tag/{}", self.base, url_encode(&tag.name))
    }

    pub fn category_link<'c>(&self, category: impl Into<CategoryRef<'c>>) -> String {
        let category = category.into();
        format!("[{}]({})", category.name, self.category_url(category))
    }

    pub fn topic_link(&self, topic: &TopicRecord) -> String {
        format!("[{}]({})", topic.title, self.topic_url(topic))
    }

    pub fn tag_link(&self, tag: &TagRecord) -> String {
        format!("[{}]({})", tag.name, self.tag_url(tag))
    }
}

/// Form-style encoding of a single path segment (space becomes `+`).
pub fn url_encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Truncate `text` to at most `max_len` characters including the omission
/// marker, preferring to cut at the last whitespace before the limit. Limits
/// too short to hold the marker hard-cut without it.
pub fn excerpt(text: &str, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }

    if max_len <= OMISSION.len() {
        return chars[..max_len].iter().collect();
    }

    let stop = max_len - OMISSION.len();
    let cut = chars[..=stop]
        .iter()
        .rposition(|ch| ch.is_whitespace())
        .unwrap_or(stop);

    let mut truncated: String = chars[..cut].iter().collect();
    truncated.push_str(OMISSION);
    truncated
}

/// One-line plain-text rendering of a cooked description, `None` when blank.
pub fn description_excerpt(description: Option<&str>) -> Option<String> {
    let text = strip_html(description?);
    (!text.is_empty()).then_some(text)
}

/// Description line with the fixed placeholder for absent descriptions.
pub fn description_or_placeholder(description: Option<&str>) -> String {
    description_excerpt(description).unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

pub fn format_date(instant: OffsetDateTime) -> String {
    instant
        .to_offset(UtcOffset::UTC)
        .format(DATE_FORMAT)
        .unwrap_or_default()
}

pub fn format_timestamp(instant: OffsetDateTime) -> String {
    instant
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_default()
}

fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut last_was_space = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                continue;
            }
            '>' if in_tag => {
                in_tag = false;
                continue;
            }
            _ if in_tag => continue,
            c if c.is_whitespace() => {
                if !last_was_space && !text.is_empty() {
                    text.push(' ');
                }
                last_was_space = true;
            }
            c => {
                text.push(c);
                last_was_space = false;
            }
        }
    }

    decode_entities(text.trim_end())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::types::Archetype;

    fn category() -> CategoryRecord {
        CategoryRecord {
            id: 5,
            name: "Q & A".to_string(),
            slug: "q a".to_string(),
            description: None,
            parent_category_id: None,
            read_restricted: false,
            position: 0,
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    fn topic() -> TopicRecord {
        TopicRecord {
            id: 42,
            title: "Hello world".to_string(),
            slug: "hello-world".to_string(),
            category: None,
            archetype: Archetype::Regular,
            views: 0,
            posts_count: 1,
            visible: true,
            deleted: false,
            created_at: datetime!(2024-03-09 17:05:33 UTC),
        }
    }

    #[test]
    fn links_encode_slugs_and_trim_base() {
        let links = Links::new("https://forum.example.com/");
        assert_eq!(
            links.category_link(&category()),
            "[Q & A](https://forum.example.com/c/q+a/5)"
        );
        assert_eq!(
            links.topic_link(&topic()),
            "[Hello world](https://forum.example.com/t/hello-world/42)"
        );
        let tag = TagRecord {
            id: 1,
            name: "c++".to_string(),
        };
        assert_eq!(
            links.tag_link(&tag),
            "[c++](https://forum.example.com/tag/c%2B%2B)"
        );
    }

    #[test]
    fn excerpt_leaves_short_text_alone() {
        assert_eq!(excerpt("short text", 10), "short text");
        assert_eq!(excerpt("", 0), "");
    }

    #[test]
    fn excerpt_cuts_at_whitespace_within_limit() {
        let result = excerpt("The quick brown fox jumps", 15);
        assert_eq!(result, "The quick...");
        assert!(result.chars().count() <= 15);
    }

    #[test]
    fn excerpt_never_exceeds_tiny_limits() {
        assert_eq!(excerpt("abcdef", 1), "a");
        assert_eq!(excerpt("abcdef", 3), "abc");
        assert_eq!(excerpt("abcdef", 0), "");
        assert_eq!(excerpt("abcdef", 4), "a...");
    }

    #[test]
    fn excerpt_hard_cuts_without_whitespace() {
        assert_eq!(excerpt("abcdefghijklmnop", 8), "abcde...");
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let result = excerpt("héllo wörld ünïcode", 12);
        assert_eq!(result, "héllo...");
    }

    #[test]
    fn description_falls_back_to_placeholder() {
        assert_eq!(description_or_placeholder(None), NO_DESCRIPTION);
        assert_eq!(description_or_placeholder(Some("  <p> </p> ")), NO_DESCRIPTION);
        assert_eq!(
            description_or_placeholder(Some("<p>News &amp; <b>updates</b>\n from staff</p>")),
            "News & updates from staff"
        );
    }

    #[test]
    fn dates_render_in_utc() {
        let instant = datetime!(2024-03-09 23:30 -02:00);
        assert_eq!(format_date(instant), "2024-03-10");
        assert_eq!(format_timestamp(instant), "2024-03-10 01:30 UTC");
    }
}

//! Shared forum fixture for document tests.

use time::{OffsetDateTime, macros::datetime};

use crate::application::settings::ConfigSnapshot;
use crate::domain::entities::{CategoryRecord, PostRecord, TagRecord};
use crate::domain::types::Archetype;
use crate::infra::export::{ExportRepository, ExportTopic, ForumExport};

pub(crate) fn base_config() -> ConfigSnapshot {
    ConfigSnapshot {
        base_url: "https://forum.example".to_string(),
        site_title: "Example Forum".to_string(),
        site_description: "A place to talk".to_string(),
        intro_text: "Welcome, crawlers.".to_string(),
        ..ConfigSnapshot::default()
    }
}

pub(crate) fn category(
    id: i64,
    name: &str,
    slug: &str,
    description: Option<&str>,
    parent_category_id: Option<i64>,
    read_restricted: bool,
    position: i32,
) -> CategoryRecord {
    CategoryRecord {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        description: description.map(str::to_string),
        parent_category_id,
        read_restricted,
        position,
        updated_at: datetime!(2024-01-01 00:00 UTC),
    }
}

pub(crate) fn topic(
    id: i64,
    title: &str,
    category_id: Option<i64>,
    created_at: OffsetDateTime,
    views: i64,
) -> ExportTopic {
    ExportTopic {
        id,
        title: title.to_string(),
        slug: title.to_ascii_lowercase().replace(' ', "-"),
        category_id,
        archetype: Archetype::Regular,
        views,
        posts_count: 1,
        visible: true,
        deleted: false,
        created_at,
        tags: Vec::new(),
    }
}

pub(crate) fn post(
    id: i64,
    topic_id: i64,
    post_number: i32,
    author: Option<&str>,
    raw: &str,
) -> PostRecord {
    PostRecord {
        id,
        topic_id,
        author: author.map(str::to_string),
        post_number,
        raw: raw.to_string(),
        hidden: false,
        deleted: false,
    }
}

/// Two public roots (one with a child and grandchild), one restricted root,
/// and topics covering every visibility rule.
pub(crate) fn forum() -> ForumExport {
    let categories = vec![
        category(1, "Announcements", "announcements", Some("<p>Official news</p>"), None, false, 1),
        category(2, "Urgent", "urgent", Some("Drop everything"), Some(1), false, 0),
        category(3, "General", "general", Some("Chat about anything"), None, false, 2),
        category(4, "Staff", "staff", Some("Secret plans"), None, true, 0),
        category(6, "Deep", "deep", None, Some(2), false, 0),
    ];

    let mut welcome = topic(10, "Welcome to the forum", Some(1), datetime!(2024-03-01 09:00 UTC), 120);
    welcome.posts_count = 3;
    welcome.tags = vec!["intro".to_string()];

    let mut quiet = topic(11, "Quiet topic", Some(3), datetime!(2024-03-02 10:00 UTC), 10);
    quiet.tags = vec!["rust".to_string()];

    let mut staff = topic(12, "Staff only", Some(4), datetime!(2024-03-03 10:00 UTC), 500);
    staff.tags = vec!["rust".to_string()];

    let loose = topic(13, "Loose thread", None, datetime!(2024-03-04 10:00 UTC), 40);

    let mut hidden = topic(14, "Hidden topic", Some(3), datetime!(2024-03-05 10:00 UTC), 90);
    hidden.visible = false;

    let mut outage = topic(15, "Server outage", Some(2), datetime!(2024-02-28 18:30 UTC), 60);
    outage.posts_count = 2;
    outage.tags = vec!["Rust".to_string()];

    let mut spam = post(103, 10, 3, Some("spammer"), "buy now");
    spam.hidden = true;
    let mut removed = post(104, 10, 4, Some("carol"), "removed reply");
    removed.deleted = true;

    let posts = vec![
        post(102, 10, 2, Some("bob"), "Thanks for the pointers!"),
        post(101, 10, 1, Some("ann"), "Hello everyone, please read the rules before posting."),
        spam,
        removed,
        post(105, 10, 5, None, "Reply from a removed account"),
        post(111, 11, 1, Some("dan"), "   "),
        post(151, 15, 1, Some("ops"), "We are investigating the outage."),
        post(152, 15, 2, Some("ann"), "Resolved."),
    ];

    let tags = vec![
        TagRecord { id: 1, name: "rust".to_string() },
        TagRecord { id: 2, name: "intro".to_string() },
        TagRecord { id: 3, name: "c++".to_string() },
    ];

    ForumExport {
        categories,
        topics: vec![welcome, quiet, staff, loose, hidden, outage],
        posts,
        tags,
    }
}

pub(crate) fn repo_with(export: ForumExport) -> ExportRepository {
    ExportRepository::new(export)
}

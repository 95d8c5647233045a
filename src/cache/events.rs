//! Content-mutation events that invalidate cached documents.

use std::fmt;
use std::str::FromStr;

/// Host-forum events the generator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    PostCreated,
    PostEdited,
    TopicCreated,
    TopicEdited,
    CategoryCreated,
    CategoryUpdated,
}

impl ContentEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentEvent::PostCreated => "post_created",
            ContentEvent::PostEdited => "post_edited",
            ContentEvent::TopicCreated => "topic_created",
            ContentEvent::TopicEdited => "topic_edited",
            ContentEvent::CategoryCreated => "category_created",
            ContentEvent::CategoryUpdated => "category_updated",
        }
    }
}

impl fmt::Display for ContentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name the generator does not react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledEvent(pub String);

impl FromStr for ContentEvent {
    type Err = UnhandledEvent;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim() {
            "post_created" => Ok(ContentEvent::PostCreated),
            "post_edited" => Ok(ContentEvent::PostEdited),
            "topic_created" => Ok(ContentEvent::TopicCreated),
            "topic_edited" => Ok(ContentEvent::TopicEdited),
            "category_created" => Ok(ContentEvent::CategoryCreated),
            "category_updated" => Ok(ContentEvent::CategoryUpdated),
            other => Err(UnhandledEvent(other.to_string())),
        }
    }
}

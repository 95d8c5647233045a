use crate::application::format::{description_or_placeholder, format_timestamp};
use crate::application::repos::{RepoError, TopicQuery};
use crate::domain::entities::{CategoryRecord, TagRecord, TopicRecord};

use super::{DocumentBuilder, ENTITY_TOPIC_LIMIT, children_of, entity_footer};

impl DocumentBuilder<'_> {
    pub(super) async fn category(&self, category: &CategoryRecord) -> Result<String, RepoError> {
        let links = self.links();
        let url = links.category_url(category);

        let mut content = format!(
            "# {}\n> Category: {}\n\n{}\n\n**Category URL:** {url}\n\n",
            category.name,
            self.config.site_title,
            description_or_placeholder(category.description.as_deref()),
        );

        let categories = self.repo.list_public_categories().await?;
        let children = children_of(&categories, category.id);
        if !children.is_empty() {
            content.push_str("## Subcategories\n\n");
            for child in children {
                content.push_str(&format!(
                    "- {}: {}\n",
                    links.category_link(child),
                    description_or_placeholder(child.description.as_deref())
                ));
            }
            content.push('\n');
        }

        let query = TopicQuery::in_category(category.id).with_limit(Some(ENTITY_TOPIC_LIMIT));
        let topics = self.repo.list_topics(&query).await?;
        if !topics.is_empty() {
            content.push_str("## Topics\n\n");
            for topic in &topics {
                content.push_str(&format!(
                    "- {} ({} views, {} replies)\n",
                    links.topic_link(topic),
                    topic.views,
                    topic.reply_count()
                ));
            }
        }

        content.push_str(&entity_footer(&url));
        Ok(content)
    }

    pub(super) async fn topic(&self, topic: &TopicRecord) -> Result<String, RepoError> {
        let links = self.links();
        let url = links.topic_url(topic);
        let category = topic
            .category
            .as_ref()
            .map_or_else(|| "Uncategorized".to_string(), |category| links.category_link(category));

        let mut content = format!(
            "# {}\n\n**Category:** {category}\n**Created:** {}\n**Views:** {}\n**Replies:** {}\n**URL:** {url}\n\n---\n\n",
            topic.title,
            format_timestamp(topic.created_at),
            topic.views,
            topic.reply_count(),
        );

        let mut posts = self.repo.list_posts(topic.id).await?;
        posts.retain(|post| post.is_renderable());
        posts.sort_by_key(|post| post.post_number);
        for post in &posts {
            let author = post.author.as_deref().unwrap_or("deleted");
            content.push_str(&format!(
                "## Post #{} by @{author}\n\n{}\n\n---\n\n",
                post.post_number, post.raw
            ));
        }

        content.push_str(&entity_footer(&url));
        Ok(content)
    }

    pub(super) async fn tag(&self, tag: &TagRecord) -> Result<String, RepoError> {
        let links = self.links();
        let url = links.tag_url(tag);

        let mut content = format!(
            "# Tag: {}\n> {}\n\n**Tag URL:** {url}\n\n## Topics with this tag\n\n",
            tag.name, self.config.site_title
        );

        let query = TopicQuery::public()
            .with_tag(tag.name.clone())
            .with_min_views(self.config.min_views)
            .with_limit(Some(ENTITY_TOPIC_LIMIT));
        let topics = self.repo.list_topics(&query).await?;
        if topics.is_empty() {
            content.push_str("No topics found with this tag.\n");
        } else {
            for topic in &topics {
                let category = topic
                    .category
                    .as_ref()
                    .map_or("Uncategorized", |category| category.name.as_str());
                content.push_str(&format!(
                    "- {} - {category} ({} views)\n",
                    links.topic_link(topic),
                    topic.views
                ));
            }
        }

        content.push_str(&entity_footer(&url));
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use crate::application::documents::fixtures::{base_config, forum, repo_with};
    use crate::application::documents::{DocumentBuilder, DocumentRequest};
    use crate::application::repos::ContentRepo;
    use crate::application::settings::ConfigSnapshot;
    use crate::infra::export::ExportRepository;

    async fn render(repo: &ExportRepository, config: &ConfigSnapshot, request: DocumentRequest<'_>) -> String {
        DocumentBuilder::new(repo, config)
            .build(request)
            .await
            .expect("document")
    }

    #[tokio::test]
    async fn category_document_lists_children_and_topics() {
        let repo = repo_with(forum());
        let config = base_config();
        let category = repo.find_category(1).await.expect("lookup").expect("category");

        let body = render(&repo, &config, DocumentRequest::Category(&category)).await;
        assert_eq!(
            body,
            "# Announcements\n> Category: Example Forum\n\nOfficial news\n\n\
             **Category URL:** https://forum.example/c/announcements/1\n\n\
             ## Subcategories\n\n\
             - [Urgent](https://forum.example/c/urgent/2): Drop everything\n\n\
             ## Topics\n\n\
             - [Welcome to the forum](https://forum.example/t/welcome-to-the-forum/10) (120 views, 2 replies)\n\
             \n**Canonical:** https://forum.example/c/announcements/1\n\
             **Original content:** https://forum.example/c/announcements/1\n"
        );
    }

    #[tokio::test]
    async fn category_without_children_or_topics() {
        let repo = repo_with(forum());
        let config = base_config();
        let category = repo.find_category(6).await.expect("lookup").expect("category");

        let body = render(&repo, &config, DocumentRequest::Category(&category)).await;
        assert!(body.starts_with("# Deep\n> Category: Example Forum\n\nNo description\n\n"));
        assert!(!body.contains("## Subcategories"));
        assert!(!body.contains("## Topics"));
    }

    #[tokio::test]
    async fn topic_document_renders_visible_posts_in_order() {
        let repo = repo_with(forum());
        let config = base_config();
        let topic = repo.find_topic(10).await.expect("lookup").expect("topic");

        let body = render(&repo, &config, DocumentRequest::Topic(&topic)).await;
        assert!(body.starts_with(
            "# Welcome to the forum\n\n\
             **Category:** [Announcements](https://forum.example/c/announcements/1)\n\
             **Created:** 2024-03-01 09:00 UTC\n\
             **Views:** 120\n**Replies:** 2\n\
             **URL:** https://forum.example/t/welcome-to-the-forum/10\n\n---\n\n\
             ## Post #1 by @ann\n\nHello everyone, please read the rules before posting.\n\n---\n\n\
             ## Post #2 by @bob\n\n"
        ));
        assert!(body.contains("## Post #5 by @deleted\n\nReply from a removed account\n\n---\n\n"));
        assert!(!body.contains("buy now"));
        assert!(!body.contains("removed reply"));
        assert!(body.ends_with(
            "---\n\n\n**Canonical:** https://forum.example/t/welcome-to-the-forum/10\n\
             **Original content:** https://forum.example/t/welcome-to-the-forum/10\n"
        ));
    }

    #[tokio::test]
    async fn uncategorized_topic_has_no_category_link() {
        let repo = repo_with(forum());
        let config = base_config();
        let topic = repo.find_topic(13).await.expect("lookup").expect("topic");

        let body = render(&repo, &config, DocumentRequest::Topic(&topic)).await;
        assert!(body.contains("**Category:** Uncategorized\n"));
    }

    #[tokio::test]
    async fn tag_document_skips_restricted_categories() {
        let repo = repo_with(forum());
        let config = base_config();
        let tag = repo.find_tag("rust").await.expect("lookup").expect("tag");

        let body = render(&repo, &config, DocumentRequest::Tag(&tag)).await;
        assert_eq!(
            body,
            "# Tag: rust\n> Example Forum\n\n**Tag URL:** https://forum.example/tag/rust\n\n\
             ## Topics with this tag\n\n\
             - [Quiet topic](https://forum.example/t/quiet-topic/11) - General (10 views)\n\
             - [Server outage](https://forum.example/t/server-outage/15) - Urgent (60 views)\n\
             \n**Canonical:** https://forum.example/tag/rust\n\
             **Original content:** https://forum.example/tag/rust\n"
        );
    }

    #[tokio::test]
    async fn tag_document_applies_min_views() {
        let repo = repo_with(forum());
        let config = ConfigSnapshot {
            min_views: 1_000,
            ..base_config()
        };
        let tag = repo.find_tag("c++").await.expect("lookup").expect("tag");

        let body = render(&repo, &config, DocumentRequest::Tag(&tag)).await;
        assert!(body.contains("**Tag URL:** https://forum.example/tag/c%2B%2B\n"));
        assert!(body.contains("## Topics with this tag\n\nNo topics found with this tag.\n"));
    }
}

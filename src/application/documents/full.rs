use std::collections::HashMap;

use crate::application::format::{description_excerpt, description_or_placeholder, excerpt};
use crate::application::repos::{RepoError, TopicQuery};

use super::{CategoryTree, DocumentBuilder};

const NO_CATEGORIES: &str = "No public categories available";
const NO_TOPICS: &str = "No topics available";

impl DocumentBuilder<'_> {
    /// The `/llms-full.txt` dump: detailed category tree and the capped topic list.
    pub(super) async fn full_content(&self) -> Result<String, RepoError> {
        let config = self.config;
        let links = self.links();

        let mut content = format!(
            "# {} - Full Content\n\n> {}\n\n",
            config.site_title, config.site_description
        );

        if !config.full_description.trim().is_empty() {
            content.push_str(&format!(
                "\n## About This Forum\n\n{}\n\n",
                config.full_description
            ));
        }

        let categories = self.detailed_categories().await?;
        let topics = self.topic_digest().await?;
        content.push_str(&format!(
            "\n[← Back to Navigation (llms.txt)]({})\n\n---\n\n## Categories and Subcategories\n\n{categories}\n\n---\n\n## Topics\n\n{topics}\n\n",
            links.absolute("/llms.txt")
        ));

        Ok(content)
    }

    async fn detailed_categories(&self) -> Result<String, RepoError> {
        let categories = self.repo.list_public_categories().await?;
        let tree = CategoryTree::new(&categories);
        if tree.is_empty() {
            return Ok(NO_CATEGORIES.to_string());
        }

        let links = self.links();
        let mut lines = Vec::new();
        for (parent, children) in &tree.roots {
            lines.push(format!("### {}", links.category_link(*parent)));

            if let Some(description) = description_excerpt(parent.description.as_deref()) {
                lines.push(String::new());
                lines.push(description);
                lines.push(String::new());
            }

            if !children.is_empty() {
                lines.push("**Subcategories:**".to_string());
                lines.push(String::new());
                for child in children {
                    lines.push(format!(
                        "- **{}**: {}",
                        links.category_link(*child),
                        description_or_placeholder(child.description.as_deref())
                    ));
                }
                lines.push(String::new());
            }
        }

        Ok(lines.join("\n"))
    }

    async fn topic_digest(&self) -> Result<String, RepoError> {
        let config = self.config;
        let query = TopicQuery::public()
            .with_min_views(config.min_views)
            .with_limit(config.posts_limit.topic_cap());
        let topics = self.repo.list_topics(&query).await?;
        if topics.is_empty() {
            return Ok(NO_TOPICS.to_string());
        }

        let first_posts: HashMap<i64, String> = if config.include_excerpts {
            let ids: Vec<i64> = topics.iter().map(|topic| topic.id).collect();
            self.repo.first_post_raws(&ids).await?.into_iter().collect()
        } else {
            HashMap::new()
        };

        let links = self.links();
        let mut lines = Vec::new();
        for topic in &topics {
            let heading = match &topic.category {
                Some(category) => format!("**{}**", links.category_link(category)),
                None => "**Uncategorized**".to_string(),
            };
            lines.push(format!("{heading} - {}", links.topic_link(topic)));

            if let Some(raw) = first_posts.get(&topic.id)
                && !raw.trim().is_empty()
            {
                lines.push(format!("  > {}", excerpt(raw, config.excerpt_length)));
                lines.push(String::new());
            }
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::application::documents::fixtures::{base_config, forum, post, repo_with, topic};
    use crate::application::documents::{DocumentBuilder, DocumentRequest};
    use crate::application::settings::ConfigSnapshot;
    use crate::domain::types::PostsLimit;
    use crate::infra::export::ForumExport;

    async fn render(export: ForumExport, config: &ConfigSnapshot) -> String {
        let repo = repo_with(export);
        DocumentBuilder::new(&repo, config)
            .build(DocumentRequest::FullContent)
            .await
            .expect("full content")
    }

    #[tokio::test]
    async fn renders_header_tree_and_topics() {
        let body = render(forum(), &base_config()).await;

        assert!(body.starts_with(
            "# Example Forum - Full Content\n\n> A place to talk\n\n\n[← Back to Navigation (llms.txt)](https://forum.example/llms.txt)\n\n---\n\n"
        ));
        assert!(body.contains(
            "### [Announcements](https://forum.example/c/announcements/1)\n\nOfficial news\n\n**Subcategories:**\n\n- **[Urgent](https://forum.example/c/urgent/2)**: Drop everything\n"
        ));
        assert!(body.contains(
            "**[Announcements](https://forum.example/c/announcements/1)** - [Welcome to the forum](https://forum.example/t/welcome-to-the-forum/10)\n  > Hello everyone, please read the rules before posting.\n"
        ));
        assert!(body.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn about_section_only_when_configured() {
        let config = ConfigSnapshot {
            full_description: "Run by volunteers.".to_string(),
            ..base_config()
        };
        let body = render(forum(), &config).await;
        assert!(body.contains("> A place to talk\n\n\n## About This Forum\n\nRun by volunteers.\n\n\n[← Back"));

        let body = render(forum(), &base_config()).await;
        assert!(!body.contains("About This Forum"));
    }

    #[tokio::test]
    async fn min_views_filters_topics() {
        let strict = ConfigSnapshot {
            min_views: 50,
            ..base_config()
        };
        let body = render(forum(), &strict).await;
        assert!(!body.contains("Quiet topic"));
        assert!(body.contains("Server outage"));

        let lenient = ConfigSnapshot {
            min_views: 5,
            ..base_config()
        };
        assert!(render(forum(), &lenient).await.contains("Quiet topic"));
    }

    #[tokio::test]
    async fn restricted_and_uncategorized_topics_are_excluded() {
        let body = render(forum(), &base_config()).await;
        assert!(!body.contains("Staff only"));
        assert!(!body.contains("Loose thread"));
        assert!(!body.contains("Hidden topic"));
        assert!(!body.contains("Secret plans"));
    }

    #[tokio::test]
    async fn blank_first_post_has_no_excerpt() {
        let body = render(forum(), &base_config()).await;
        assert!(body.contains(
            "**[General](https://forum.example/c/general/3)** - [Quiet topic](https://forum.example/t/quiet-topic/11)\n**[Announcements]"
        ));
    }

    #[tokio::test]
    async fn excerpts_are_truncated_or_disabled() {
        let config = ConfigSnapshot {
            excerpt_length: 20,
            ..base_config()
        };
        let body = render(forum(), &config).await;
        assert!(body.contains("  > Hello everyone,...\n"));

        let config = ConfigSnapshot {
            include_excerpts: false,
            ..base_config()
        };
        assert!(!render(forum(), &config).await.contains("  > "));
    }

    #[tokio::test]
    async fn tier_caps_topic_count() {
        let mut export = ForumExport {
            categories: forum().categories,
            ..ForumExport::default()
        };
        for id in 1..=510 {
            let created_at = datetime!(2024-01-01 00:00 UTC) + time::Duration::minutes(id);
            export.topics.push(topic(id, "Bulk", Some(3), created_at, 0));
            export.posts.push(post(id, id, 1, Some("ann"), "body"));
        }
        let config = ConfigSnapshot {
            posts_limit: PostsLimit::Small,
            include_excerpts: false,
            ..base_config()
        };

        let body = render(export, &config).await;
        assert_eq!(body.matches("](https://forum.example/t/bulk/").count(), 500);
        assert!(!body.contains("/t/bulk/10)"));
    }

    #[tokio::test]
    async fn empty_forum_uses_placeholders() {
        let body = render(ForumExport::default(), &base_config()).await;
        assert!(body.contains("## Categories and Subcategories\n\nNo public categories available\n\n---"));
        assert!(body.contains("## Topics\n\nNo topics available\n\n"));
    }
}

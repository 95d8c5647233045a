use crate::application::format::{description_or_placeholder, format_date};
use crate::application::repos::{RepoError, TopicQuery};

use super::{CategoryTree, DocumentBuilder};

const NO_CATEGORIES: &str = "No public categories available";
const NO_TOPICS: &str = "No topics yet";
const UNCATEGORIZED: &str = "Uncategorized";

impl DocumentBuilder<'_> {
    /// The `/llms.txt` index: category tree, latest topics and resource links.
    pub(super) async fn navigation(&self) -> Result<String, RepoError> {
        let config = self.config;
        let categories = self.category_outline().await?;
        let latest = self.latest_topics().await?;
        let resources = self.resource_links();

        let content = format!(
            "# {title}\n> {description}\n\n{intro}\n\n## Categories and Subcategories\n{categories}\n\n## Latest Topics\n{latest}\n\n## Additional Resources\n{resources}\n",
            title = config.site_title,
            description = config.site_description,
            intro = config.intro_text,
        );

        Ok(content.trim().to_string())
    }

    async fn category_outline(&self) -> Result<String, RepoError> {
        let categories = self.repo.list_public_categories().await?;
        let tree = CategoryTree::new(&categories);
        if tree.is_empty() {
            return Ok(NO_CATEGORIES.to_string());
        }

        let links = self.links();
        let mut lines = Vec::new();
        for (parent, children) in &tree.roots {
            lines.push(format!("### {}", links.category_link(*parent)));
            lines.push(description_or_placeholder(parent.description.as_deref()));

            if !children.is_empty() {
                lines.push(String::new());
                for child in children {
                    lines.push(format!(
                        "- {}: {}",
                        links.category_link(*child),
                        description_or_placeholder(child.description.as_deref())
                    ));
                }
            }

            lines.push(String::new());
        }

        Ok(lines.join("\n"))
    }

    async fn latest_topics(&self) -> Result<String, RepoError> {
        let query = TopicQuery::public().with_limit(Some(self.config.latest_topics_limit()));
        let topics = self.repo.list_topics(&query).await?;
        if topics.is_empty() {
            return Ok(NO_TOPICS.to_string());
        }

        let links = self.links();
        Ok(topics
            .iter()
            .map(|topic| {
                let category = topic
                    .category
                    .as_ref()
                    .map_or(UNCATEGORIZED, |category| category.name.as_str());
                format!(
                    "- {} - {} ({})",
                    links.topic_link(topic),
                    category,
                    format_date(topic.created_at)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn resource_links(&self) -> String {
        let links = &self.config.links;
        let mut lines = vec![format!(
            "- [Full Documentation (llms-full.txt)]({}): Complete forum content",
            self.links().absolute("/llms-full.txt")
        )];

        let optional = [
            (&links.about_url, "About", "About this community"),
            (&links.faq_url, "FAQ", "Frequently asked questions"),
            (&links.tos_url, "Terms of Service", "Community guidelines"),
            (&links.privacy_url, "Privacy Policy", "Privacy information"),
        ];
        for (url, label, summary) in optional {
            if let Some(url) = url.as_deref().filter(|url| !url.trim().is_empty()) {
                lines.push(format!("- [{label}]({url}): {summary}"));
            }
        }

        lines.join("\n")
    }
}

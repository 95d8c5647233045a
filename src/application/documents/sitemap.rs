use std::collections::HashMap;

use crate::application::format::url_encode;
use crate::application::repos::{RepoError, TopicQuery};
use crate::domain::entities::CategoryRecord;

use super::{DocumentBuilder, MAX_CATEGORY_DEPTH};

impl DocumentBuilder<'_> {
    /// The `/sitemaps.txt` list of every generated document URL.
    pub(super) async fn sitemap(&self) -> Result<String, RepoError> {
        let config = self.config;
        let links = self.links();

        let mut urls = vec![links.absolute("/llms.txt"), links.absolute("/llms-full.txt")];

        let mut categories = self.repo.list_public_categories().await?;
        categories.sort_by_key(|category| category.id);
        let mut known: HashMap<i64, CategoryRecord> = categories
            .iter()
            .map(|category| (category.id, category.clone()))
            .collect();
        for category in &categories {
            let path = self.category_path(category, &mut known).await?;
            urls.push(links.absolute(&format!("/c/{path}/llms.txt")));
        }

        let query = TopicQuery::public()
            .with_min_views(config.min_views)
            .with_limit(Some(config.posts_limit.sitemap_cap()));
        for topic in self.repo.list_topics(&query).await? {
            urls.push(format!("{}/llms.txt", links.topic_url(&topic)));
        }

        if config.tagging_enabled {
            for tag in self.repo.list_tags().await? {
                urls.push(format!("{}/llms.txt", links.tag_url(&tag)));
            }
        }

        Ok(urls.join("\n"))
    }

    /// `ancestor-slug/.../slug/id`, following parents up to [`MAX_CATEGORY_DEPTH`] levels.
    ///
    /// Ancestors missing from `known` (restricted parents) are fetched and memoized.
    async fn category_path(
        &self,
        category: &CategoryRecord,
        known: &mut HashMap<i64, CategoryRecord>,
    ) -> Result<String, RepoError> {
        let mut segments = vec![category.id.to_string(), url_encode(&category.slug)];
        let mut parent_id = category.parent_category_id;

        for _ in 0..MAX_CATEGORY_DEPTH {
            let Some(id) = parent_id else { break };
            if !known.contains_key(&id) {
                let Some(parent) = self.repo.find_category(id).await? else {
                    break;
                };
                known.insert(id, parent);
            }
            let Some(parent) = known.get(&id) else { break };
            segments.push(url_encode(&parent.slug));
            parent_id = parent.parent_category_id;
        }

        segments.reverse();
        Ok(segments.join("/"))
    }
}

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::{
    application::repos::{ContentRepo, RepoError, TopicQuery},
    domain::{
        entities::{
            CategoryRecord, ContentActivity, PostRecord, TagRecord, TopicCategory, TopicRecord,
        },
        types::Archetype,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const CATEGORY_COLUMNS: &str = "SELECT id::bigint AS id, name, slug, description, \
    parent_category_id::bigint AS parent_category_id, read_restricted, position, updated_at \
    FROM categories";

const TOPIC_COLUMNS: &str = "SELECT t.id::bigint AS id, t.title, t.slug, t.archetype, \
    t.views::bigint AS views, t.posts_count::bigint AS posts_count, t.visible, \
    (t.deleted_at IS NOT NULL) AS deleted, t.created_at, \
    c.id::bigint AS category_id, c.name AS category_name, c.slug AS category_slug, \
    c.read_restricted AS category_read_restricted \
    FROM topics t LEFT JOIN categories c ON c.id = t.category_id";

/// The host stores timestamps without zone information, in UTC.
#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    parent_category_id: Option<i64>,
    read_restricted: bool,
    position: Option<i32>,
    updated_at: PrimitiveDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent_category_id: row.parent_category_id,
            read_restricted: row.read_restricted,
            position: row.position.unwrap_or_default(),
            updated_at: row.updated_at.assume_utc(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: i64,
    title: String,
    slug: Option<String>,
    archetype: String,
    views: i64,
    posts_count: i64,
    visible: bool,
    deleted: bool,
    created_at: PrimitiveDateTime,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_read_restricted: Option<bool>,
}

impl From<TopicRow> for TopicRecord {
    fn from(row: TopicRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(TopicCategory {
                id,
                name,
                slug,
                read_restricted: row.category_read_restricted.unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            slug: row.slug.unwrap_or_else(|| "topic".to_string()),
            category,
            archetype: Archetype::from_db(&row.archetype),
            views: row.views,
            posts_count: row.posts_count,
            visible: row.visible,
            deleted: row.deleted,
            created_at: row.created_at.assume_utc(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    topic_id: i64,
    author: Option<String>,
    post_number: i32,
    raw: String,
    hidden: bool,
    deleted: bool,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            topic_id: row.topic_id,
            author: row.author,
            post_number: row.post_number,
            raw: row.raw,
            hidden: row.hidden,
            deleted: row.deleted,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    latest_topic_created_at: Option<PrimitiveDateTime>,
    latest_category_updated_at: Option<PrimitiveDateTime>,
}

#[async_trait]
impl ContentRepo for PostgresRepositories {
    async fn list_public_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{CATEGORY_COLUMNS} WHERE NOT read_restricted ORDER BY position ASC, id ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn find_category_by_slug(
        &self,
        parent_id: Option<i64>,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(CATEGORY_COLUMNS);
        qb.push(" WHERE LOWER(slug) = LOWER(");
        qb.push_bind(slug);
        qb.push(")");
        match parent_id {
            Some(parent_id) => {
                qb.push(" AND parent_category_id = ");
                qb.push_bind(parent_id);
            }
            None => {
                qb.push(" AND parent_category_id IS NULL");
            }
        }
        qb.push(" ORDER BY id LIMIT 1");

        let row = qb
            .build_query_as::<CategoryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn list_topics(&self, query: &TopicQuery) -> Result<Vec<TopicRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(TOPIC_COLUMNS);
        Self::apply_topic_query(&mut qb, query);

        let rows = qb
            .build_query_as::<TopicRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TopicRecord::from).collect())
    }

    async fn find_topic(&self, id: i64) -> Result<Option<TopicRecord>, RepoError> {
        let row = sqlx::query_as::<_, TopicRow>(&format!("{TOPIC_COLUMNS} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(TopicRecord::from))
    }

    async fn first_post_raws(&self, topic_ids: &[i64]) -> Result<Vec<(i64, String)>, RepoError> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT topic_id::bigint, raw
            FROM posts
            WHERE post_number = 1
              AND deleted_at IS NULL
              AND topic_id = ANY($1)
            "#,
        )
        .bind(topic_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                p.id::bigint AS id,
                p.topic_id::bigint AS topic_id,
                u.username AS author,
                p.post_number,
                p.raw,
                p.hidden,
                (p.deleted_at IS NOT NULL) AS deleted
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.topic_id = $1
              AND NOT p.hidden
              AND p.deleted_at IS NULL
            ORDER BY p.post_number ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_tag(&self, name: &str) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id::bigint AS id, name FROM tags WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id::bigint AS id, name FROM tags ORDER BY id")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn content_activity(&self) -> Result<ContentActivity, RepoError> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                (SELECT MAX(created_at) FROM topics WHERE deleted_at IS NULL) AS latest_topic_created_at,
                (SELECT MAX(updated_at) FROM categories) AS latest_category_updated_at
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContentActivity {
            latest_topic_created_at: row.latest_topic_created_at.map(PrimitiveDateTime::assume_utc),
            latest_category_updated_at: row
                .latest_category_updated_at
                .map(PrimitiveDateTime::assume_utc),
        })
    }
}

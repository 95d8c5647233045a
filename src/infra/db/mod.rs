//! Postgres-backed repository implementations.
//!
//! Content queries read the host forum's tables directly; the only table this
//! crate owns is `llms_txt_access`.

mod access;
mod content;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
};

use crate::application::repos::TopicQuery;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    /// Append the WHERE clause shared by every topic list.
    fn apply_topic_query<'q>(qb: &mut QueryBuilder<'q, Postgres>, topic_query: &'q TopicQuery) {
        qb.push(
            " WHERE t.visible AND t.deleted_at IS NULL AND t.archetype = 'regular'",
        );

        if topic_query.public_category_only {
            qb.push(" AND c.id IS NOT NULL AND NOT c.read_restricted");
        }

        if let Some(category_id) = topic_query.category_id {
            qb.push(" AND t.category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(min_views) = topic_query.min_views {
            qb.push(" AND t.views >= ");
            qb.push_bind(min_views);
        }

        if let Some(tag) = topic_query.tag.as_ref() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM topic_tags tt INNER JOIN tags tg ON tg.id = tt.tag_id WHERE tt.topic_id = t.id AND LOWER(tg.name) = LOWER(",
            );
            qb.push_bind(tag);
            qb.push("))");
        }

        qb.push(" ORDER BY t.created_at DESC, t.id DESC");

        if let Some(limit) = topic_query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }
    }
}

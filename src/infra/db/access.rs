use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{AccessCount, AccessRepo, RepoError};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AccessRow {
    route: String,
    count: i64,
    last_access_at: Option<OffsetDateTime>,
}

#[async_trait]
impl AccessRepo for PostgresRepositories {
    async fn record_access(&self, route: &str, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO llms_txt_access (route, count, last_access_at)
            VALUES ($1, 1, $2)
            ON CONFLICT (route) DO UPDATE
            SET count = llms_txt_access.count + 1,
                last_access_at = GREATEST(llms_txt_access.last_access_at, EXCLUDED.last_access_at)
            "#,
        )
        .bind(route)
        .bind(at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_access_counts(&self) -> Result<Vec<AccessCount>, RepoError> {
        let rows = sqlx::query_as::<_, AccessRow>(
            "SELECT route, count, last_access_at FROM llms_txt_access ORDER BY route",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AccessCount {
                route: row.route,
                count: row.count,
                last_access_at: row.last_access_at,
            })
            .collect())
    }
}

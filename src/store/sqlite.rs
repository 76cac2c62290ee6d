use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::ProgressError;
use crate::progress::model::CourseProgress;

use super::{ProgressStore, StoredProgress};

/// SQLite-backed document store: one row per (user, course) pair holding the
/// full progress record as JSON plus a version counter for conditional
/// writes.
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// connect and make sure the schema exists
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            "create table if not exists course_progress (
                user_id text not null,
                course_id text not null,
                version integer not null,
                document text not null,
                updated_at text not null,
                primary key (user_id, course_id)
            )",
        )
        .execute(&self.pool)
        .await?;
        info!("progress schema ready");
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn get(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<StoredProgress>, ProgressError> {
        let row = sqlx::query(
            "select version, document from course_progress where user_id = ? and course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let version: i64 = row.try_get("version")?;
        let document: String = row.try_get("document")?;
        let progress = serde_json::from_str(&document)?;
        Ok(Some(StoredProgress { version, progress }))
    }

    async fn insert(&self, progress: &CourseProgress) -> Result<bool, ProgressError> {
        let document = serde_json::to_string(progress)?;
        let result = sqlx::query(
            "insert into course_progress (user_id, course_id, version, document, updated_at)
             values (?, ?, 1, ?, ?)
             on conflict (user_id, course_id) do nothing",
        )
        .bind(&progress.user_id)
        .bind(&progress.course_id)
        .bind(document)
        .bind(progress.last_accessed)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update(
        &self,
        progress: &CourseProgress,
        expected_version: i64,
    ) -> Result<bool, ProgressError> {
        let document = serde_json::to_string(progress)?;
        let result = sqlx::query(
            "update course_progress set document = ?, version = version + 1, updated_at = ?
             where user_id = ? and course_id = ? and version = ?",
        )
        .bind(document)
        .bind(progress.last_accessed)
        .bind(&progress.user_id)
        .bind(&progress.course_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::file_repository::FileRecordStore;
use crate::core::error::{AppError, Result};
use crate::features::files::models::{FileRecord, NewFileRecord};

/// Postgres-backed record store over the `files` table
#[derive(Clone)]
pub struct PgFileRecordStore {
    pool: PgPool,
}

impl PgFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordStore for PgFileRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT * FROM files WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn create(&self, file: NewFileRecord) -> Result<FileRecord> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (name, content_type, size, url, storage_path, owner_id, is_public, shared_with)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, '{}')
            RETURNING *
            "#,
        )
        .bind(&file.name)
        .bind(&file.content_type)
        .bind(file.size)
        .bind(&file.url)
        .bind(&file.storage_path)
        .bind(&file.owner_id)
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted file record: id={}", record.id);
        Ok(record)
    }

    async fn set_public(&self, id: &str, is_public: bool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE files SET is_public = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(is_public)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        Ok(())
    }
}

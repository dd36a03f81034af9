//! File metadata records and repository.

use serde::Serialize;
use sqlx::FromRow;

use crate::db::DbPool;
use crate::{PinpinError, Result};

const FILE_COLUMNS: &str =
    "id, owner_id, name, size, mime_type, storage_path, shared, share_token, uploaded_at";

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    pub mime_type: String,
    /// Blob path relative to the store root.
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub shared: bool,
    #[serde(skip_serializing)]
    pub share_token: Option<String>,
    pub uploaded_at: String,
}

/// Metadata for a new file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: i64,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub storage_path: String,
}

/// Repository for file metadata.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (owner_id, name, size, mime_type, storage_path)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(file.owner_id)
            .bind(&file.name)
            .bind(file.size)
            .bind(&file.mime_type)
            .bind(&file.storage_path)
            .fetch_one(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))
    }

    /// Look up a shared file by its token. Unshared files are not returned.
    pub async fn get_by_share_token(&self, token: &str) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE share_token = ? AND shared = 1");
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(token)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))
    }

    /// List a user's files, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?
             ORDER BY uploaded_at DESC, id DESC"
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))
    }

    /// Mark a file shared under `token`. An existing token is kept.
    pub async fn share(&self, id: i64, token: &str) -> Result<FileRecord> {
        let sql = format!(
            "UPDATE files SET shared = 1, share_token = COALESCE(share_token, ?)
             WHERE id = ?
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(token)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))?
            .ok_or_else(|| PinpinError::NotFound("file".to_string()))
    }

    /// Delete a record. Returns false if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

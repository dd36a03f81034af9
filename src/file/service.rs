//! File service for PinPin.
//!
//! Uploads are charged against the owner's plan quota before the blob is
//! written; every failure after that point gives the bytes back.

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::plan::PlanRepository;
use crate::{PinpinError, Result};

use super::metadata::{FileRecord, FileRepository, NewFile};
use super::storage::BlobStore;
use super::MAX_FILENAME_LENGTH;

/// A file read back from the store.
#[derive(Debug)]
pub struct Download {
    pub record: FileRecord,
    pub content: Vec<u8>,
}

/// File service bound to one pool and blob store.
pub struct FileService<'a> {
    pool: &'a DbPool,
    store: &'a BlobStore,
    max_file_size: u64,
}

impl<'a> FileService<'a> {
    pub fn new(pool: &'a DbPool, store: &'a BlobStore, max_file_size: u64) -> Self {
        Self {
            pool,
            store,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upload `content` as `name` for `owner_id`.
    pub async fn upload(&self, owner_id: i64, name: &str, content: &[u8]) -> Result<FileRecord> {
        let name = validate_file_name(name)?;
        let size = content.len() as u64;
        if size > self.max_file_size {
            return Err(PinpinError::Validation(format!(
                "file is too large (max {})",
                format_size(self.max_file_size)
            )));
        }
        let size = size as i64;

        let plans = PlanRepository::new(self.pool);
        if !plans.reserve(owner_id, size).await? {
            let plan = plans
                .get(owner_id)
                .await?
                .ok_or_else(|| PinpinError::NotFound("plan".to_string()))?;
            warn!(owner_id, size, used = plan.storage_used, limit = plan.storage_limit, "Upload over quota");
            return Err(PinpinError::QuotaExceeded {
                used: plan.storage_used,
                limit: plan.storage_limit,
            });
        }

        let storage_path = BlobStore::blob_path(owner_id, name);
        if let Err(e) = self.store.put(&storage_path, content) {
            plans.release(owner_id, size).await?;
            return Err(e);
        }

        let new_file = NewFile {
            owner_id,
            name: name.to_string(),
            size,
            mime_type: mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            storage_path,
        };
        let record = match FileRepository::new(self.pool).create(&new_file).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&new_file.storage_path) {
                    warn!(path = %new_file.storage_path, error = %cleanup, "Failed to remove orphaned blob");
                }
                plans.release(owner_id, size).await?;
                return Err(e);
            }
        };

        info!(owner_id, file_id = record.id, size, "File uploaded");
        Ok(record)
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.pool).list_by_owner(owner_id).await
    }

    /// Metadata of one of the caller's files.
    pub async fn get(&self, owner_id: i64, file_id: i64) -> Result<FileRecord> {
        let record = FileRepository::new(self.pool)
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| PinpinError::NotFound("file".to_string()))?;
        if record.owner_id != owner_id {
            return Err(PinpinError::Permission(
                "you do not own this file".to_string(),
            ));
        }
        Ok(record)
    }

    pub async fn download(&self, owner_id: i64, file_id: i64) -> Result<Download> {
        let record = self.get(owner_id, file_id).await?;
        let content = self.store.get(&record.storage_path)?;
        Ok(Download { record, content })
    }

    /// Download a file through its share token.
    pub async fn download_shared(&self, token: &str) -> Result<Download> {
        let record = FileRepository::new(self.pool)
            .get_by_share_token(token)
            .await?
            .ok_or_else(|| PinpinError::NotFound("shared file".to_string()))?;
        let content = self.store.get(&record.storage_path)?;
        Ok(Download { record, content })
    }

    /// Share one of the caller's files. Returns the record and its token.
    pub async fn share(&self, owner_id: i64, file_id: i64) -> Result<(FileRecord, String)> {
        self.get(owner_id, file_id).await?;
        let token = Uuid::new_v4().simple().to_string();
        let record = FileRepository::new(self.pool).share(file_id, &token).await?;
        let token = record
            .share_token
            .clone()
            .ok_or_else(|| PinpinError::Database("share token missing".to_string()))?;
        info!(owner_id, file_id, "File shared");
        Ok((record, token))
    }

    /// Delete one of the caller's files and give its bytes back.
    pub async fn delete(&self, owner_id: i64, file_id: i64) -> Result<()> {
        let record = self.get(owner_id, file_id).await?;
        if FileRepository::new(self.pool).delete(record.id).await? {
            PlanRepository::new(self.pool)
                .release(owner_id, record.size)
                .await?;
        }
        if !self.store.delete(&record.storage_path)? {
            warn!(file_id, path = %record.storage_path, "Blob already missing on delete");
        }
        info!(owner_id, file_id, "File deleted");
        Ok(())
    }
}

/// Public URL of a shared file.
pub fn share_url(public_url: &str, token: &str) -> String {
    format!("{}/api/share/{token}", public_url.trim_end_matches('/'))
}

/// Human readable size, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn validate_file_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PinpinError::Validation("file name is required".to_string()));
    }
    if name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(PinpinError::Validation(format!(
            "file name must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(PinpinError::Validation(
            "file name contains invalid characters".to_string(),
        ));
    }
    Ok(name)
}

//! File storage for PinPin.
//!
//! - Blob storage rooted at a configured directory
//! - File metadata in the database
//! - Quota-checked uploads, share links and deletion

mod metadata;
mod service;
mod storage;

pub use metadata::{FileRecord, FileRepository, NewFile};
pub use service::{format_size, share_url, Download, FileService};
pub use storage::BlobStore;

/// Maximum length for a file name (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

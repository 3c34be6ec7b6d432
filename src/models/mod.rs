use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::{media_type::listing_mime, validation::format_file_size};

/// A file in the storage directory, derived from a directory entry and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl StoredFile {
    pub fn new(name: String, size_bytes: u64) -> Self {
        let mime_type = listing_mime(&name);
        Self {
            name,
            size_bytes,
            mime_type,
        }
    }
}

/// Listing entry as returned by `GET /api/list`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// On-disk file name; the only identifier
    pub file_name: String,
    /// Human-readable size, e.g. `1.50 KB`
    pub file_size: String,
    /// Normalized MIME type or `unknown`
    pub file_type: String,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        Self {
            file_size: format_file_size(file.size_bytes),
            file_name: file.name,
            file_type: file.mime_type,
        }
    }
}

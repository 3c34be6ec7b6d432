use crate::api::error::AppError;
use crate::models::StoredFile;
use crate::utils::validation::resolve_in_root;
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Subdirectory of the storage root holding in-flight uploads
pub const STAGING_DIR: &str = ".staging";

pub struct FileMetadata {
    pub size: u64,
    pub last_modified: Option<SystemTime>,
}

pub type FileReader = Box<dyn AsyncRead + Unpin + Send + 'static>;

#[async_trait]
pub trait FileStore: Send + Sync {
    fn root(&self) -> &Path;
    async fn is_available(&self) -> bool;
    async fn exists(&self, name: &str) -> Result<bool, AppError>;
    async fn list(&self) -> Result<Vec<StoredFile>, AppError>;
    /// Writes `reader` under `name`, failing with `Conflict` if the name is taken.
    /// Returns the number of bytes stored.
    async fn create_exclusive<'a>(
        &self,
        name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64, AppError>;
    async fn delete(&self, name: &str) -> Result<(), AppError>;
    async fn metadata(&self, name: &str) -> Result<FileMetadata, AppError>;
    async fn open_range(&self, name: &str, start: u64, length: u64) -> Result<FileReader, AppError>;
}

/// Flat directory on the local filesystem.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Opens (creating if needed) the storage directory and its staging area.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(STAGING_DIR)).await?;
        Ok(Self { root })
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, AppError> {
        resolve_in_root(&self.root, name)
    }
}

fn not_found(name: &str) -> AppError {
    AppError::NotFound(format!("File '{}' not found", name))
}

fn map_io(name: &str, e: std::io::Error) -> AppError {
    if e.kind() == ErrorKind::NotFound {
        not_found(name)
    } else {
        AppError::Io(e)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn is_available(&self) -> bool {
        tokio::fs::read_dir(&self.root).await.is_ok()
    }

    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let path = self.path_of(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn list(&self) -> Result<Vec<StoredFile>, AppError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            tracing::error!("Failed to read storage directory {:?}: {}", self.root, e);
            AppError::Unavailable("Unable to list files".to_string())
        })?;

        let mut files = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read storage directory {:?}: {}", self.root, e);
                    return Err(AppError::Unavailable("Unable to list files".to_string()));
                }
            };

            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };

            // Entry may vanish between readdir and stat
            let metadata = match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", name, e);
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            files.push(StoredFile::new(name, metadata.len()));
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn create_exclusive<'a>(
        &self,
        name: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64, AppError> {
        let target = self.path_of(name)?;

        // Dropping the temp file on any early return removes it
        let staging = self.root.join(STAGING_DIR);
        let (temp_file, writer) = tokio::task::spawn_blocking(move || {
            let temp_file = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(".part")
                .tempfile_in(staging)?;
            let writer = temp_file.reopen()?;
            Ok::<_, std::io::Error>((temp_file, writer))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Staging task failed: {}", e)))??;
        let mut temp_file_async = tokio::fs::File::from_std(writer);

        let written = tokio::io::copy(&mut reader, &mut temp_file_async).await?;
        temp_file_async.flush().await?;
        temp_file_async.sync_all().await?;
        drop(temp_file_async);

        let persisted = tokio::task::spawn_blocking(move || temp_file.persist_noclobber(&target))
            .await
            .map_err(|e| AppError::Internal(format!("Persist task failed: {}", e)))?;

        match persisted {
            Ok(_) => Ok(written),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(AppError::Conflict(
                "File with the same name already exists".to_string(),
            )),
            Err(e) => Err(AppError::Io(e.error)),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.path_of(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io(name, e))?;
        if !metadata.is_file() {
            return Err(not_found(name));
        }
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| map_io(name, e))
    }

    async fn metadata(&self, name: &str) -> Result<FileMetadata, AppError> {
        let path = self.path_of(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io(name, e))?;
        if !metadata.is_file() {
            return Err(not_found(name));
        }
        Ok(FileMetadata {
            size: metadata.len(),
            last_modified: metadata.modified().ok(),
        })
    }

    async fn open_range(&self, name: &str, start: u64, length: u64) -> Result<FileReader, AppError> {
        let path = self.path_of(name)?;
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| map_io(name, e))?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(Box::new(file.take(length)))
    }
}

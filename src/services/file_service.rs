use crate::api::error::AppError;
use crate::models::{FileEntry, StoredFile};
use crate::services::storage::{FileReader, FileStore};
use crate::utils::media_type::content_type_for;
use crate::utils::range::{ByteRange, parse_range};
use crate::utils::validation::sanitize_filename;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::AsyncRead;

pub struct FileService {
    store: Arc<dyn FileStore>,
}

/// An opened file ready to be streamed, full or partial.
pub struct FileView {
    pub name: String,
    pub content_type: String,
    pub total_size: u64,
    /// `None` when the whole file is served
    pub range: Option<ByteRange>,
    pub last_modified: Option<SystemTime>,
    pub reader: FileReader,
}

impl FileView {
    pub fn content_length(&self) -> u64 {
        self.range.map_or(self.total_size, |r| r.length())
    }
}

fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(message.to_string())),
    }
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub async fn list_files(&self) -> Result<Vec<FileEntry>, AppError> {
        let files: Vec<StoredFile> = self.store.list().await?;
        Ok(files.into_iter().map(FileEntry::from).collect())
    }

    /// Validates the requested name before any payload is read.
    ///
    /// Returns the sanitized name the upload will be stored under.
    pub async fn prepare_upload(&self, requested: Option<&str>) -> Result<String, AppError> {
        let requested = require(requested, "Filename is required")?;
        let name = sanitize_filename(requested)?;

        if self.store.exists(&name).await? {
            tracing::warn!("Upload rejected, '{}' already exists", name);
            return Err(AppError::Conflict(
                "File with the same name already exists".to_string(),
            ));
        }

        Ok(name)
    }

    /// Streams the payload to disk under a name returned by [`Self::prepare_upload`].
    ///
    /// The final create is exclusive, so a concurrent upload that won the race
    /// still yields `Conflict` here.
    pub async fn store_upload<'a>(
        &self,
        name: &str,
        reader: impl AsyncRead + Unpin + Send + 'a,
    ) -> Result<u64, AppError> {
        match self.store.create_exclusive(name, Box::new(reader)).await {
            Ok(written) => {
                tracing::info!("Stored '{}' ({} bytes)", name, written);
                Ok(written)
            }
            Err(AppError::Conflict(msg)) => {
                tracing::warn!("Upload lost race for '{}'", name);
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete_file(&self, name: Option<&str>) -> Result<(), AppError> {
        let name = require(name, "File name is required")?;
        self.store.delete(name).await?;
        tracing::info!("Deleted '{}'", name);
        Ok(())
    }

    /// Opens `name` for streaming, honouring an optional `Range` header value.
    pub async fn open_view(
        &self,
        name: &str,
        range_header: Option<&str>,
    ) -> Result<FileView, AppError> {
        let metadata = self.store.metadata(name).await?;
        let total_size = metadata.size;

        let range = match range_header {
            Some(header) => Some(
                parse_range(header, total_size)
                    .map_err(|_| AppError::RangeNotSatisfiable { size: total_size })?,
            ),
            None => None,
        };

        let (start, length) = match range {
            Some(r) => (r.start, r.length()),
            None => (0, total_size),
        };
        let reader = self.store.open_range(name, start, length).await?;

        Ok(FileView {
            name: name.to_string(),
            content_type: content_type_for(name),
            total_size,
            range,
            last_modified: metadata.last_modified,
            reader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::LocalFileStore;
    use tokio::io::AsyncReadExt;

    async fn service() -> (tempfile::TempDir, FileService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::open(dir.path()).await.unwrap();
        (dir, FileService::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_prepare_upload_validates_name() {
        let (_dir, service) = service().await;
        assert!(matches!(
            service.prepare_upload(None).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));
        assert!(matches!(
            service.prepare_upload(Some("")).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));
        assert_eq!(
            service.prepare_upload(Some("a b#1.txt")).await.unwrap(),
            "a_b_1.txt"
        );
    }

    #[tokio::test]
    async fn test_upload_then_conflict() {
        let (_dir, service) = service().await;
        let name = service.prepare_upload(Some("a b#1.txt")).await.unwrap();
        service.store_upload(&name, &b"hello"[..]).await.unwrap();

        assert!(matches!(
            service.prepare_upload(Some("a b#1.txt")).await.unwrap_err(),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            service.store_upload(&name, &b"again"[..]).await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_open_view_range() {
        let (_dir, service) = service().await;
        service
            .store_upload("clip.mp4", &[7u8; 1000][..])
            .await
            .unwrap();

        let mut view = service
            .open_view("clip.mp4", Some("bytes=0-99"))
            .await
            .unwrap();
        assert_eq!(view.content_type, "video/mp4");
        assert_eq!(view.content_length(), 100);

        let mut buf = Vec::new();
        view.reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf.len(), 100);

        assert!(matches!(
            service
                .open_view("clip.mp4", Some("bytes=1000-"))
                .await
                .err()
                .unwrap(),
            AppError::RangeNotSatisfiable { size: 1000 }
        ));
        assert!(matches!(
            service.open_view("missing.mp4", None).await.err().unwrap(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_name() {
        let (_dir, service) = service().await;
        assert!(matches!(
            service.delete_file(None).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));
        assert!(matches!(
            service.delete_file(Some("never.txt")).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}

use crate::domain::DomainError;
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Contract for the uploaded-image store. Lets handlers and services run
/// against an in-memory double in tests instead of the real filesystem.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists uploaded bytes and returns the public path ("/images/...")
    /// the article will reference.
    async fn save(&self, original_filename: &str, data: &[u8]) -> Result<String, DomainError>;

    /// Best-effort removal of a previously stored image. Failure is logged
    /// and swallowed: a stale file must never fail the surrounding mutation.
    async fn remove(&self, public_path: &str);
}

pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// `root` is the directory published as `/images`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn unique_name(original_filename: &str) -> String {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let millis = chrono::Utc::now().timestamp_millis();
        let noise: u64 = rand::thread_rng().gen();
        format!("{}-{:x}{}", millis, noise, ext)
    }

    fn file_for(&self, public_path: &str) -> Option<PathBuf> {
        // Only paths we issued ourselves are removable.
        let name = public_path.strip_prefix("/images/")?;
        if name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, original_filename: &str, data: &[u8]) -> Result<String, DomainError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DomainError::InternalError(format!("Failed to create images dir: {}", e)))?;

        let name = Self::unique_name(original_filename);
        let path = self.root.join(&name);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| DomainError::InternalError(format!("Failed to store image: {}", e)))?;

        tracing::debug!("Stored image {} ({} bytes)", path.display(), data.len());
        Ok(format!("/images/{}", name))
    }

    async fn remove(&self, public_path: &str) {
        let Some(path) = self.file_for(public_path) else {
            tracing::debug!("Skipping removal of foreign image path {}", public_path);
            return;
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove image {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_returns_public_path_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        let public = store.save("photo.png", b"png-bytes").await.unwrap();
        assert!(public.starts_with("/images/"));
        assert!(public.ends_with(".png"));

        let on_disk = dir.path().join(public.strip_prefix("/images/").unwrap());
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn remove_is_silent_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        // Neither of these may panic or error.
        store.remove("/images/never-existed.jpg").await;
        store.remove("https://example.com/external.jpg").await;
    }

    #[tokio::test]
    async fn remove_deletes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        let public = store.save("a.jpg", b"data").await.unwrap();
        let on_disk = dir.path().join(public.strip_prefix("/images/").unwrap());
        assert!(on_disk.exists());

        store.remove(&public).await;
        assert!(!on_disk.exists());
    }

    #[test]
    fn filenames_without_extension_are_accepted() {
        let name = LocalImageStore::unique_name("raw");
        assert!(!name.contains('.'));
    }
}

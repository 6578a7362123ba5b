use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// URL segment under which stored objects are publicly served.
pub const PUBLIC_PREFIX: &str = "/storage/v1/object/public";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("empty upload")]
    Empty,

    #[error("upload too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("not a storage url: {0}")]
    ForeignUrl(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bucket and object path recovered from a public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageUsage {
    pub files: u64,
    pub bytes: u64,
}

/// Image bucket kept on the local filesystem as `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
    max_size: usize,
}

impl ObjectStore {
    pub async fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
        max_size: usize,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        let bucket = bucket.into();
        validate_segment(&bucket)?;
        fs::create_dir_all(root.join(&bucket)).await?;

        info!(root = %root.display(), bucket = %bucket, "object store initialized");

        Ok(Self {
            root,
            bucket,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.public_base_url, PUBLIC_PREFIX, self.bucket, path
        )
    }

    /// Store an image under `<folder>/<millis>-<random>.<ext>`, overwriting any
    /// object already at that path.
    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredObject, StorageError> {
        if data.is_empty() {
            return Err(StorageError::Empty);
        }
        if data.len() > self.max_size {
            return Err(StorageError::TooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }
        if !content_type.starts_with("image/") {
            return Err(StorageError::UnsupportedType(content_type.to_string()));
        }

        let folder = folder.trim_matches('/');
        validate_segment(folder)?;

        let random = Uuid::new_v4().simple().to_string();
        let object_name = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            &random[..10],
            file_extension(file_name)
        );
        let path = format!("{folder}/{object_name}");
        let target = self.object_path(&self.bucket, &path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, data).await?;

        debug!(path = %path, size = data.len(), "stored object");

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            url: self.public_url(&path),
            path,
            size: data.len(),
        })
    }

    /// Remove an object from this store's bucket. Locations naming any other
    /// bucket are refused.
    pub async fn remove(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        if location.bucket != self.bucket {
            return Err(StorageError::ForeignUrl(format!(
                "{}/{}",
                location.bucket, location.path
            )));
        }
        let target = self.object_path(&location.bucket, &location.path)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(bucket = %location.bucket, path = %location.path, "removed object");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(
                format!("{}/{}", location.bucket, location.path),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_by_url(&self, url: &str) -> Result<ObjectLocation, StorageError> {
        let location =
            parse_public_url(url).ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        self.remove(&location).await?;
        Ok(location)
    }

    /// Delete the object behind `url`, logging instead of failing so the
    /// calling operation can carry on.
    pub async fn delete_quietly(&self, url: &str) {
        if url.trim().is_empty() {
            return;
        }
        if let Err(err) = self.delete_by_url(url).await {
            warn!(error = %err, url = %url, "image cleanup failed");
        }
    }

    /// Count files and bytes across every bucket under the root.
    pub async fn usage(&self) -> Result<StorageUsage, StorageError> {
        let mut usage = StorageUsage::default();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push(entry.path());
                } else if meta.is_file() {
                    usage.files += 1;
                    usage.bytes += meta.len();
                }
            }
        }

        Ok(usage)
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        validate_segment(bucket)?;
        validate_segment(path)?;
        Ok(self.root.join(bucket).join(path))
    }
}

/// Recover bucket and path from `.../storage/v1/object/public/<bucket>/<path>`.
pub fn parse_public_url(url: &str) -> Option<ObjectLocation> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let (_, rest) = without_query.split_once(PUBLIC_PREFIX)?;
    let rest = rest.strip_prefix('/')?;
    let (bucket, path) = rest.split_once('/')?;
    if bucket.is_empty() || path.is_empty() || path.ends_with('/') {
        return None;
    }
    Some(ObjectLocation {
        bucket: bucket.to_string(),
        path: path.to_string(),
    })
}

fn file_extension(file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() { "bin".to_string() } else { ext }
}

/// Relative, non-empty and free of `..`.
fn validate_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty() || segment.contains('\\') {
        return Err(StorageError::InvalidPath(segment.to_string()));
    }
    let ok = Path::new(segment)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(segment.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (ObjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path(), "images", "http://localhost:3000/", 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[test]
    fn parses_bucket_and_path_from_public_url() {
        let loc = parse_public_url(
            "https://cdn.example.com/storage/v1/object/public/images/products/1-abc.png?v=2",
        )
        .unwrap();
        assert_eq!(loc.bucket, "images");
        assert_eq!(loc.path, "products/1-abc.png");
    }

    #[test]
    fn rejects_urls_outside_the_public_prefix() {
        assert!(parse_public_url("https://example.com/images/a.png").is_none());
        assert!(parse_public_url("https://x/storage/v1/object/public/images").is_none());
        assert!(parse_public_url("https://x/storage/v1/object/public/images/").is_none());
        assert!(parse_public_url("").is_none());
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(file_extension("photo.JPG"), "jpg");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "bin");
        assert_eq!(file_extension("weird.p/n\\g"), "png");
    }

    #[tokio::test]
    async fn upload_then_delete_by_url() {
        let (store, dir) = test_store().await;
        let stored = store
            .upload("products", "shirt.png", "image/png", b"fake-png")
            .await
            .unwrap();

        assert!(stored.path.starts_with("products/"));
        assert!(stored.path.ends_with(".png"));
        assert!(
            stored
                .url
                .starts_with("http://localhost:3000/storage/v1/object/public/images/products/")
        );
        assert!(dir.path().join("images").join(&stored.path).exists());

        let loc = store.delete_by_url(&stored.url).await.unwrap();
        assert_eq!(loc.path, stored.path);
        assert!(!dir.path().join("images").join(&stored.path).exists());

        let again = store.delete_by_url(&stored.url).await;
        assert!(matches!(again, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn upload_validation() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.upload("images", "a.png", "image/png", b"").await,
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            store.upload("images", "a.png", "image/png", &[0u8; 2048]).await,
            Err(StorageError::TooLarge { size: 2048, max: 1024 })
        ));
        assert!(matches!(
            store.upload("images", "a.txt", "text/plain", b"hi").await,
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(matches!(
            store.upload("../etc", "a.png", "image/png", b"hi").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn traversal_paths_are_refused_on_delete() {
        let (store, _dir) = test_store().await;
        let loc = ObjectLocation {
            bucket: "images".into(),
            path: "../../secret".into(),
        };
        assert!(matches!(
            store.remove(&loc).await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn other_buckets_are_never_deleted() {
        let (store, dir) = test_store().await;
        let backups = dir.path().join("backups");
        std::fs::create_dir_all(&backups).unwrap();
        std::fs::write(backups.join("db.sql"), b"dump").unwrap();

        let res = store
            .delete_by_url("https://evil.example/storage/v1/object/public/backups/db.sql")
            .await;
        assert!(matches!(res, Err(StorageError::ForeignUrl(_))));
        assert!(backups.join("db.sql").exists());

        store
            .delete_quietly("http://localhost:3000/storage/v1/object/public/backups/db.sql")
            .await;
        assert!(backups.join("db.sql").exists());
    }

    #[tokio::test]
    async fn usage_counts_files_and_bytes() {
        let (store, _dir) = test_store().await;
        store.upload("a", "1.png", "image/png", b"12345").await.unwrap();
        store.upload("b", "2.jpg", "image/jpeg", b"123").await.unwrap();

        let usage = store.usage().await.unwrap();
        assert_eq!(usage, StorageUsage { files: 2, bytes: 8 });
    }

    #[tokio::test]
    async fn quiet_delete_swallows_errors() {
        let (store, _dir) = test_store().await;
        store.delete_quietly("https://elsewhere.example/x.png").await;
        store.delete_quietly("").await;
    }
}

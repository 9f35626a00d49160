use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// MIME types accepted by `POST /picture`.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/pjpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Upper bound for a single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A file the media store has persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub size: i64,
}

/// StorageService
///
/// Contract of the media store. `DiskStorage` writes into the uploads directory that the
/// router serves statically; `MockStorageService` keeps files in memory for tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the storage root if it does not exist yet. Called once at startup.
    async fn ensure_root(&self) -> Result<(), StorageError>;

    /// Persists `bytes` under a freshly generated, unique filename derived from
    /// `original_name`.
    async fn save(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile, StorageError>;

    /// Best-effort removal. Failures are logged at debug level and otherwise ignored.
    async fn remove(&self, filename: &str);
}

/// sanitize_filename
///
/// Reduces a client-supplied filename to a single safe path segment: directory parts are
/// dropped and anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// generate_filename
///
/// `<unix-millis>-<8 hex chars>-<sanitised name>`. The random part keeps two uploads of
/// the same name within one millisecond apart.
pub fn generate_filename(original_name: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &nonce[..8],
        sanitize_filename(original_name)
    )
}

// --- Disk ---

/// DiskStorage
///
/// Writes uploads into `root`, the directory mounted under the static path.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

#[async_trait]
impl StorageService for DiskStorage {
    async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Io {
                path: self.root.display().to_string(),
                source,
            })
    }

    async fn save(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile, StorageError> {
        let filename = generate_filename(original_name);
        let path = self.path_of(&filename);

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| StorageError::Io {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(filename = %filename, size = bytes.len(), "stored upload");
        Ok(StoredFile {
            filename,
            size: bytes.len() as i64,
        })
    }

    async fn remove(&self, filename: &str) {
        // Stored names never contain separators, but the argument may come from the database.
        let path = self.path_of(&sanitize_filename(filename));
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %e, "could not remove upload");
        }
    }
}

// --- Mock ---

/// MockStorageService
///
/// In-memory media store for service and HTTP tests. `new_failing` simulates a storage
/// outage on every write.
#[derive(Clone, Default)]
pub struct MockStorageService {
    should_fail: bool,
    files: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub async fn contains(&self, filename: &str) -> bool {
        self.files.lock().await.contains_key(filename)
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.lock().await.is_empty()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_root(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn save(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile, StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "mock storage error: simulation requested".to_string(),
            ));
        }
        let filename = generate_filename(original_name);
        self.files.lock().await.insert(filename.clone(), bytes.len());
        Ok(StoredFile {
            filename,
            size: bytes.len() as i64,
        })
    }

    async fn remove(&self, filename: &str) {
        self.files.lock().await.remove(filename);
    }
}

/// StorageState
///
/// The concrete type used to share the media store across the application state.
pub type StorageState = Arc<dyn StorageService>;

//! Markdown cache keyed by URL hash

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::{
    fs,
    sync::{Mutex, OwnedMutexGuard},
};
use tracing::debug;

use crate::{CacheError, Result};

/// File extension of every cache entry
pub const CACHE_EXTENSION: &str = "md";

/// Compute the cache key for a URL: lowercase hex SHA-256 of the URL string
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

type LockTable = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Held while a URL is being resolved; dropping it releases the key
pub struct EntryGuard {
    key: PathBuf,
    locks: Arc<LockTable>,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        // Only the table and this guard reference the mutex when nobody waits
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 2);
    }
}

/// Write-once Markdown cache rooted at a single directory
pub struct ContentCache {
    root: PathBuf,
    locks: Arc<LockTable>,
}

impl ContentCache {
    /// Create a cache rooted at `root`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic path of the entry for `url`
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", cache_key(url), CACHE_EXTENSION))
    }

    /// Return the entry path if `url` has already been cached
    pub async fn lookup(&self, url: &str) -> Result<Option<PathBuf>> {
        let path = self.path_for(url);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                debug!("Cache hit for {} at {}", url, path.display());
                Ok(Some(path))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss for {}", url);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the entry for `url` and return its path.
    ///
    /// The content goes to a sibling temp file first and is renamed into place,
    /// so readers never observe a partial entry.
    pub async fn store(&self, url: &str, content: &str) -> Result<PathBuf> {
        self.ensure_root().await?;

        let path = self.path_for(url);
        let tmp = path.with_extension(format!("{}.tmp.{}", CACHE_EXTENSION, std::process::id()));

        fs::write(&tmp, content)
            .await
            .map_err(|source| CacheError::Write {
                path: tmp.clone(),
                source,
            })?;
        if let Err(source) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CacheError::Write { path, source });
        }

        debug!("Cached {} ({} bytes) at {}", url, content.len(), path.display());
        Ok(path)
    }

    /// Acquire the per-entry lock for `url`.
    ///
    /// Callers check, fetch and store while holding the guard; a second caller
    /// for the same URL waits and then finds the entry already cached.
    pub async fn lock(&self, url: &str) -> EntryGuard {
        let key = self.path_for(url);
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        EntryGuard {
            key,
            locks: Arc::clone(&self.locks),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Number of entries currently on disk
    pub async fn len(&self) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry
                .path()
                .extension()
                .map_or(false, |ext| ext == CACHE_EXTENSION)
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }
}

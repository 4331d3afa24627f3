//! On-disk artifact store

use crate::errors::{CacheError, RecoveryHint, Result};
use crate::eviction;
use crate::keys::CacheKey;
use codeon_core::CACHE_ARTIFACT_EXTENSION;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

const PARTIAL_SUFFIX: &str = ".partial";

/// A cached artifact found by [`BuildCache::lookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub key: CacheKey,
    pub path: PathBuf,
    pub size: u64,
}

/// Summary of the cache contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub base_dir: PathBuf,
    pub entries: usize,
    pub total_bytes: u64,
    pub max_bytes: Option<u64>,
}

/// Content-addressed store of compiled artifacts
///
/// Cheap to clone; all clones share one directory. Writes go through a
/// temporary file and an atomic rename, so racing stores of the same key are
/// safe and the last writer wins.
#[derive(Debug, Clone)]
pub struct BuildCache {
    inner: Arc<CacheInner>,
}

#[derive(Debug)]
struct CacheInner {
    base_dir: PathBuf,
    max_bytes: Option<u64>,
}

impl BuildCache {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: Option<u64>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .map_err(|e| CacheError::io(&base_dir, "create cache directory", e))?;

        Ok(Self {
            inner: Arc::new(CacheInner {
                base_dir,
                max_bytes,
            }),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.inner.base_dir
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.inner.max_bytes
    }

    fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.inner
            .base_dir
            .join(format!("{}.{}", key.as_str(), CACHE_ARTIFACT_EXTENSION))
    }

    /// Find the artifact for `key`, refreshing its last-use time on a hit
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<CachedArtifact>> {
        let path = self.artifact_path(key);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, "read artifact metadata", e)),
        };

        touch(&path);

        Ok(Some(CachedArtifact {
            key: key.clone(),
            path,
            size: metadata.len(),
        }))
    }

    /// Store a freshly compiled artifact, then enforce the size bound
    pub fn store(&self, key: &CacheKey, artifact: &[u8]) -> Result<()> {
        let path = self.artifact_path(key);
        self.write_entry(&path, artifact).map_err(|source| CacheError::Write {
            key: key.to_string(),
            source,
            recovery_hint: RecoveryHint::Ignore,
        })?;

        tracing::debug!(
            cache_key = %key.short(),
            bytes = artifact.len(),
            "artifact stored"
        );

        if let Some(max_bytes) = self.inner.max_bytes {
            self.enforce_bound(max_bytes, &path)?;
        }

        Ok(())
    }

    /// Write a hidden `.partial` sibling, then rename it over the entry
    ///
    /// Readers see either the old file or the complete new one. A failed
    /// write removes its partial file when dropped.
    fn write_entry(&self, path: &Path, artifact: &[u8]) -> std::io::Result<()> {
        let mut partial = tempfile::Builder::new()
            .prefix(".")
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.inner.base_dir)?;
        partial.write_all(artifact)?;
        partial.as_file().sync_all()?;
        partial.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Copy a cached artifact to `destination` and make it executable
    pub fn copy_into(&self, artifact: &CachedArtifact, destination: &Path) -> Result<()> {
        fs::copy(&artifact.path, destination)
            .map_err(|e| CacheError::io(&artifact.path, "copy artifact", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(destination, fs::Permissions::from_mode(0o755))
                .map_err(|e| CacheError::io(destination, "mark artifact executable", e))?;
        }

        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let entries = eviction::scan_entries(&self.inner.base_dir)?;
        Ok(CacheStats {
            base_dir: self.inner.base_dir.clone(),
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.size).sum(),
            max_bytes: self.inner.max_bytes,
        })
    }

    /// Remove every artifact, returning how many were deleted
    pub fn clear(&self) -> Result<usize> {
        let entries = eviction::scan_entries(&self.inner.base_dir)?;
        let count = entries.len();
        eviction::evict(&entries);
        tracing::info!(entries = count, "build cache cleared");
        Ok(count)
    }

    fn enforce_bound(&self, max_bytes: u64, just_written: &Path) -> Result<()> {
        let entries = eviction::scan_entries(&self.inner.base_dir)?;
        let victims = eviction::select_victims(entries, max_bytes, just_written);
        if victims.is_empty() {
            return Ok(());
        }

        let reclaimed = eviction::evict(&victims);
        tracing::info!(
            evicted = victims.len(),
            reclaimed_bytes = reclaimed,
            max_bytes,
            "build cache over size bound, evicted least recently used artifacts"
        );
        Ok(())
    }
}

/// Refresh the last-use timestamp; failures only weaken LRU ordering
fn touch(path: &Path) {
    let result = OpenOptions::new()
        .append(true)
        .open(path)
        .and_then(|file| file.set_modified(SystemTime::now()));

    if let Err(e) = result {
        tracing::trace!(path = %path.display(), error = %e, "could not refresh artifact mtime");
    }
}

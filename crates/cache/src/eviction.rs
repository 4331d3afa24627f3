//! Size-bounded LRU eviction
//!
//! An entry's modification time doubles as its last-use timestamp: it is set
//! when the entry is written and refreshed on every hit.

use crate::errors::{CacheError, Result};
use codeon_core::CACHE_ARTIFACT_EXTENSION;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One artifact file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub path: PathBuf,
    pub size: u64,
    pub last_used: SystemTime,
}

/// List artifact files, skipping in-flight temporary writes
pub fn scan_entries(base_dir: &Path) -> Result<Vec<EntryInfo>> {
    let read_dir = match fs::read_dir(base_dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(base_dir, "scan cache directory", e)),
    };

    let mut entries = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CACHE_ARTIFACT_EXTENSION) {
            continue;
        }

        // Entries can vanish under a concurrent eviction
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        entries.push(EntryInfo {
            path,
            size: metadata.len(),
            last_used: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    Ok(entries)
}

/// Pick least-recently-used entries to delete until the total fits in
/// `max_bytes`. `protected` is never selected.
pub fn select_victims(
    mut entries: Vec<EntryInfo>,
    max_bytes: u64,
    protected: &Path,
) -> Vec<EntryInfo> {
    let mut total: u64 = entries.iter().map(|e| e.size).sum();
    if total <= max_bytes {
        return Vec::new();
    }

    entries.sort_by(|a, b| a.last_used.cmp(&b.last_used).then(a.path.cmp(&b.path)));

    let mut victims = Vec::new();
    for entry in entries {
        if total <= max_bytes {
            break;
        }
        if entry.path == protected {
            continue;
        }
        total = total.saturating_sub(entry.size);
        victims.push(entry);
    }

    victims
}

/// Delete the selected entries, returning how many bytes were reclaimed
pub fn evict(victims: &[EntryInfo]) -> u64 {
    let mut reclaimed = 0;
    for victim in victims {
        match fs::remove_file(&victim.path) {
            Ok(()) => reclaimed += victim.size,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %victim.path.display(),
                    error = %e,
                    "Failed to evict cache entry"
                );
            }
        }
    }
    reclaimed
}

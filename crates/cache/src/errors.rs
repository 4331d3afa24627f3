//! Error types for the build cache

use std::fmt;
use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors during cache operations
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Writing an artifact failed
    Write {
        key: String,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },
}

/// What a caller can do about a cache error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Operation can be safely ignored; the engine recompiles instead
    Ignore,
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        let recovery_hint = match source.kind() {
            std::io::ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: path.clone(),
            },
            _ => RecoveryHint::Ignore,
        };

        Self::Io {
            path,
            operation,
            source,
            recovery_hint,
        }
    }

    pub fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Write { recovery_hint, .. } => recovery_hint,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Write { key, source, .. } => {
                write!(f, "Failed to store artifact '{key}': {source}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
        }
    }
}

impl From<CacheError> for codeon_core::Error {
    fn from(error: CacheError) -> Self {
        codeon_core::Error::cache_with_source(error.to_string(), error)
    }
}

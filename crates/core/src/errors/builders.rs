//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    #[must_use]
    pub fn unsupported_language(language: impl Into<String>) -> Self {
        Error::UnsupportedLanguage {
            language: language.into(),
        }
    }

    /// Create a cache error wrapping its underlying cause
    #[must_use]
    pub fn cache_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Cache {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for codeon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for codeon operations using thiserror
///
/// Outcomes of user programs (compile errors, timeouts, non-zero exits) are
/// not errors; they are reported through `ExecutionOutcome`. This type covers
/// failures of the engine itself and of its supporting layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    Configuration { message: String },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Requested language has no registered toolchain
    UnsupportedLanguage { language: String },

    /// Build cache errors surfaced to the engine
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

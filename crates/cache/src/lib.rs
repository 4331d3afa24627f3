//! Build cache for codeon
//!
//! Compiled artifacts are stored on disk under a key derived from the
//! language and the exact source text, so identical submissions skip the
//! compiler. Entries are written once and never modified; the only way an
//! entry disappears is eviction under the configured size bound.

pub mod errors;
pub mod eviction;
pub mod keys;
pub mod store;

pub use errors::{CacheError, RecoveryHint, Result};
pub use keys::CacheKey;
pub use store::{BuildCache, CacheStats, CachedArtifact};

/// Constants used throughout the codeon workspace
use std::time::Duration;

// Output limits
/// Maximum number of characters kept per captured stream or created file.
pub const MAX_OUTPUT_CHARS: usize = 50_000;

pub const STDOUT_TRUNCATION_MARKER: &str = "\n... [Output Truncated]";
pub const STDERR_TRUNCATION_MARKER: &str = "\n... [Error Truncated]";
pub const FILE_TRUNCATION_MARKER: &str = "\n... [File Truncated]";

// Timing
pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(5);
pub const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on how long the runner waits for the memory sampler to stop.
pub const SAMPLER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on draining stdout/stderr after the child has been reaped.
pub const STREAM_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

// Cache
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 1024 * 1024 * 1024; // 1GB
pub const CACHE_ARTIFACT_EXTENSION: &str = "artifact";

// Workspaces
pub const WORKSPACE_PREFIX: &str = "codeon-";

// Environment variable names
pub const CODEON_CONFIG_VAR: &str = "CODEON_CONFIG";
pub const CODEON_LOG_VAR: &str = "CODEON_LOG";
pub const CODEON_EXECUTION_TIMEOUT_VAR: &str = "CODEON_EXECUTION_TIMEOUT";
pub const CODEON_CACHE_DIR_VAR: &str = "CODEON_CACHE_DIR";
pub const CODEON_CACHE_MAX_BYTES_VAR: &str = "CODEON_CACHE_MAX_BYTES";
pub const CODEON_WORKSPACE_ROOT_VAR: &str = "CODEON_WORKSPACE_ROOT";

// Config file
pub const CONFIG_FILENAME: &str = "config.json";

// Template placeholders
pub const SOURCE_PLACEHOLDER: &str = "{source}";
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";
pub const WORKDIR_PLACEHOLDER: &str = "{workdir}";

/// Intermediate build outputs that never count as program-created files.
pub const INTERMEDIATE_EXTENSIONS: &[&str] = &["class", "o", "obj", "ppu"];

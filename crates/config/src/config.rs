//! Engine configuration types

use codeon_core::{Error, Result, DEFAULT_CACHE_MAX_BYTES, DEFAULT_EXECUTION_TIMEOUT};
use codeon_utils::XdgPaths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration as stored in `config.json`
///
/// ```json
/// {
///   "compiler_paths": { "python": "python3", "c": "/usr/bin/gcc", "java_run": "java" },
///   "execution_timeout": 5,
///   "cache_max_bytes": 1073741824
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tool key → executable. When present, only languages listed here are
    /// supported; when absent every built-in language is enabled.
    pub compiler_paths: Option<BTreeMap<String, String>>,
    /// Execution timeout in seconds
    pub execution_timeout: f64,
    /// Directory holding cached artifacts
    pub cache_dir: Option<PathBuf>,
    /// Total size bound for the build cache; `null` means unbounded
    pub cache_max_bytes: Option<u64>,
    /// Directory under which per-execution workspaces are created
    pub workspace_root: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compiler_paths: None,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT.as_secs_f64(),
            cache_dir: None,
            cache_max_bytes: Some(DEFAULT_CACHE_MAX_BYTES),
            workspace_root: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.execution_timeout)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(XdgPaths::build_cache_dir)
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        if !self.execution_timeout.is_finite() || self.execution_timeout <= 0.0 {
            return Err(Error::configuration(format!(
                "execution_timeout must be a positive number of seconds, got {}",
                self.execution_timeout
            )));
        }

        // Duration::from_secs_f64 panics on overflow
        if self.execution_timeout > u32::MAX as f64 {
            return Err(Error::configuration(format!(
                "execution_timeout is too large: {}",
                self.execution_timeout
            )));
        }

        if let Some(paths) = &self.compiler_paths {
            for (key, executable) in paths {
                if key.trim().is_empty() {
                    return Err(Error::configuration(
                        "compiler_paths contains an empty language key",
                    ));
                }
                if executable.trim().is_empty() {
                    return Err(Error::configuration(format!(
                        "compiler_paths entry '{key}' has an empty executable"
                    )));
                }
            }
        }

        if self.cache_max_bytes == Some(0) {
            return Err(Error::configuration(
                "cache_max_bytes must be greater than zero (use null for no bound)",
            ));
        }

        Ok(())
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.compiler_paths.is_none());
        assert_eq!(config.execution_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_max_bytes, Some(1024 * 1024 * 1024));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "execution_timeout": 2.5 }"#).unwrap();
        assert_eq!(config.execution_timeout(), Duration::from_millis(2500));
        assert_eq!(config.cache_max_bytes, Some(DEFAULT_CACHE_MAX_BYTES));
        assert!(config.compiler_paths.is_none());
    }

    #[test]
    fn test_null_cache_bound_means_unbounded() {
        let config = EngineConfig::from_json(r#"{ "cache_max_bytes": null }"#).unwrap();
        assert_eq!(config.cache_max_bytes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compiler_paths_parse() {
        let config = EngineConfig::from_json(
            r#"{ "compiler_paths": { "c": "/usr/bin/gcc", "java_run": "java" } }"#,
        )
        .unwrap();
        let paths = config.compiler_paths.unwrap();
        assert_eq!(paths.get("c").map(String::as_str), Some("/usr/bin/gcc"));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = EngineConfig {
            execution_timeout: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            execution_timeout: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            compiler_paths: Some(BTreeMap::from([("c".to_string(), " ".to_string())])),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'c'"));

        let config = EngineConfig {
            cache_max_bytes: Some(0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}

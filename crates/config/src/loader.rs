//! Configuration loader for codeon
//!
//! Resolution order, lowest precedence first: built-in defaults, the
//! configuration file, `CODEON_*` environment variables, and finally values
//! set on the loader by the caller (command-line flags).

use crate::config::{ConfigSource, EngineConfig};
use codeon_core::{
    Error, Result, ResultExt, CODEON_CACHE_DIR_VAR, CODEON_CACHE_MAX_BYTES_VAR,
    CODEON_CONFIG_VAR, CODEON_EXECUTION_TIMEOUT_VAR, CODEON_WORKSPACE_ROOT_VAR,
};
use codeon_utils::XdgPaths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A loaded configuration together with its origin
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub source: ConfigSource,
}

/// Configuration loader that handles all startup configuration
pub struct ConfigLoader {
    /// Explicit configuration file
    file: Option<PathBuf>,
    /// Environment snapshot; read from the process when not set
    env: Option<HashMap<String, String>>,
    /// Whether to look for the XDG default file
    discover_default_file: bool,
    execution_timeout: Option<f64>,
    cache_dir: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env: None,
            discover_default_file: true,
            execution_timeout: None,
            cache_dir: None,
        }
    }

    /// Load from this file; it must exist
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use these variables instead of the process environment
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Whether to fall back to `$XDG_CONFIG_HOME/codeon/config.json`
    pub fn discover_default_file(mut self, discover: bool) -> Self {
        self.discover_default_file = discover;
        self
    }

    /// Override the execution timeout (seconds)
    pub fn execution_timeout(mut self, seconds: f64) -> Self {
        self.execution_timeout = Some(seconds);
        self
    }

    /// Override the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Load, override and validate the configuration
    pub fn load(self) -> Result<LoadedConfig> {
        let env = self
            .env
            .clone()
            .unwrap_or_else(|| std::env::vars().collect());

        let (mut config, source) = match self.config_file(&env) {
            Some(path) => (read_config_file(&path)?, ConfigSource::ConfigFile(path)),
            None => (EngineConfig::default(), ConfigSource::Default),
        };

        apply_env_overrides(&mut config, &env)?;

        if let Some(seconds) = self.execution_timeout {
            config.execution_timeout = seconds;
        }
        if let Some(dir) = self.cache_dir {
            config.cache_dir = Some(dir);
        }

        config.validate()?;

        tracing::debug!(source = ?source, "configuration loaded");

        Ok(LoadedConfig { config, source })
    }

    fn config_file(&self, env: &HashMap<String, String>) -> Option<PathBuf> {
        if let Some(path) = &self.file {
            return Some(path.clone());
        }

        if let Some(path) = env.get(CODEON_CONFIG_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }

        if self.discover_default_file {
            let default = XdgPaths::config_file();
            if default.is_file() {
                return Some(default);
            }
        }

        None
    }
}

fn read_config_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read configuration file", e))?;

    EngineConfig::from_json(&content)
        .with_context(|| format!("invalid configuration file {}", path.display()))
}

fn apply_env_overrides(config: &mut EngineConfig, env: &HashMap<String, String>) -> Result<()> {
    if let Some(value) = env.get(CODEON_EXECUTION_TIMEOUT_VAR) {
        config.execution_timeout = value.trim().parse::<f64>().map_err(|_| {
            Error::configuration(format!(
                "{CODEON_EXECUTION_TIMEOUT_VAR} must be a number of seconds, got '{value}'"
            ))
        })?;
    }

    if let Some(value) = env.get(CODEON_CACHE_DIR_VAR).filter(|v| !v.is_empty()) {
        config.cache_dir = Some(PathBuf::from(value));
    }

    if let Some(value) = env.get(CODEON_CACHE_MAX_BYTES_VAR) {
        config.cache_max_bytes = match value.trim() {
            "none" | "unbounded" => None,
            bytes => Some(bytes.parse::<u64>().map_err(|_| {
                Error::configuration(format!(
                    "{CODEON_CACHE_MAX_BYTES_VAR} must be a byte count or 'none', got '{value}'"
                ))
            })?),
        };
    }

    if let Some(value) = env.get(CODEON_WORKSPACE_ROOT_VAR).filter(|v| !v.is_empty()) {
        config.workspace_root = Some(PathBuf::from(value));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn loader() -> ConfigLoader {
        ConfigLoader::new()
            .discover_default_file(false)
            .env(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_defaults_without_file() {
        let loaded = loader().load().unwrap();
        assert_eq!(loaded.source, ConfigSource::Default);
        assert_eq!(loaded.config, EngineConfig::default());
    }

    #[test]
    fn test_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "compiler_paths": { "python": "python3" }, "execution_timeout": 3 }"#,
        )
        .unwrap();

        let loaded = loader().file(&path).load().unwrap();
        assert_eq!(loaded.source, ConfigSource::ConfigFile(path));
        assert_eq!(loaded.config.execution_timeout(), Duration::from_secs(3));
        assert!(loaded
            .config
            .compiler_paths
            .unwrap()
            .contains_key("python"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = loader().file(temp.path().join("absent.json")).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_mentions_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = loader().file(&path).load().unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_config_file_from_env() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("from-env.json");
        std::fs::write(&path, r#"{ "execution_timeout": 7 }"#).unwrap();

        let loaded = ConfigLoader::new()
            .discover_default_file(false)
            .env([(CODEON_CONFIG_VAR, path.to_string_lossy().to_string())])
            .load()
            .unwrap();
        assert_eq!(loaded.config.execution_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_env_overrides() {
        let loaded = ConfigLoader::new()
            .discover_default_file(false)
            .env([
                (CODEON_EXECUTION_TIMEOUT_VAR, "1.5"),
                (CODEON_CACHE_DIR_VAR, "/var/cache/codeon"),
                (CODEON_CACHE_MAX_BYTES_VAR, "none"),
                (CODEON_WORKSPACE_ROOT_VAR, "/scratch"),
            ])
            .load()
            .unwrap();

        let config = loaded.config;
        assert_eq!(config.execution_timeout(), Duration::from_millis(1500));
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/codeon"));
        assert_eq!(config.cache_max_bytes, None);
        assert_eq!(config.workspace_root(), PathBuf::from("/scratch"));
    }

    #[test]
    fn test_invalid_env_override() {
        let result = ConfigLoader::new()
            .discover_default_file(false)
            .env([(CODEON_EXECUTION_TIMEOUT_VAR, "soon")])
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_caller_overrides_win() {
        let loaded = ConfigLoader::new()
            .discover_default_file(false)
            .env([(CODEON_EXECUTION_TIMEOUT_VAR, "9")])
            .execution_timeout(0.5)
            .cache_dir("/tmp/explicit")
            .load()
            .unwrap();

        assert_eq!(loaded.config.execution_timeout(), Duration::from_millis(500));
        assert_eq!(loaded.config.cache_dir(), PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn test_caller_override_is_validated() {
        let result = loader().execution_timeout(-1.0).load();
        assert!(result.is_err());
    }
}

use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "codeon";

/// XDG Base Directory paths for codeon
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/codeon or fallback
    pub fn config_dir() -> PathBuf {
        resolve(env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir(), ".config")
    }

    /// Get XDG_CACHE_HOME/codeon or fallback
    pub fn cache_dir() -> PathBuf {
        resolve(env::var("XDG_CACHE_HOME").ok(), dirs::home_dir(), ".cache")
    }

    /// Default location of the engine configuration file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join(codeon_core::CONFIG_FILENAME)
    }

    /// Default location of compiled artifacts
    pub fn build_cache_dir() -> PathBuf {
        Self::cache_dir().join("build")
    }
}

fn resolve(xdg_value: Option<String>, home: Option<PathBuf>, fallback: &str) -> PathBuf {
    xdg_value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            home.map(|home| home.join(fallback))
                .unwrap_or_else(|| Path::new(fallback).to_path_buf())
        })
        .join(APP_DIR)
}

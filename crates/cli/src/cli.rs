use crate::commands::Commands;
use clap::Parser;
use codeon_config::ConfigLoader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codeon")]
#[command(about = "Compile and run programs in many languages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to $CODEON_CONFIG, then the XDG config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for cached build artifacts
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Execution timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration loader with command-line overrides applied on top
    pub fn config_loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        if let Some(dir) = &self.cache_dir {
            loader = loader.cache_dir(dir);
        }
        if let Some(seconds) = self.timeout {
            loader = loader.execution_timeout(seconds);
        }
        loader
    }
}

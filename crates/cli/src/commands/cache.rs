use clap::Subcommand;
use codeon_cache::{BuildCache, CacheStats};
use codeon_config::EngineConfig;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove every cached artifact
    Clear,
    /// Show cache location and size
    Stats,
}

impl CacheCommands {
    pub fn execute(self, config: &EngineConfig) -> eyre::Result<()> {
        let cache = BuildCache::new(config.cache_dir(), config.cache_max_bytes)?;

        match self {
            CacheCommands::Clear => {
                let removed = cache.clear()?;
                println!("✓ Removed {removed} cached artifact(s)");
            }
            CacheCommands::Stats => {
                for line in describe(&cache.stats()?) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

fn describe(stats: &CacheStats) -> Vec<String> {
    let limit = match stats.max_bytes {
        Some(bytes) => format!("{:.2} MB", bytes as f64 / 1_048_576.0),
        None => "unbounded".to_string(),
    };

    vec![
        "Build cache:".to_string(),
        format!("  Location: {}", stats.base_dir.display()),
        format!("  Entries: {}", stats.entries),
        format!(
            "  Size: {:.2} MB",
            stats.total_bytes as f64 / 1_048_576.0
        ),
        format!("  Limit: {limit}"),
    ]
}

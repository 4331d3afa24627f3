use codeon_config::EngineConfig;
use codeon_exec::ToolchainRegistry;

pub fn execute(config: &EngineConfig) -> eyre::Result<()> {
    let registry = ToolchainRegistry::from_config(config);
    if registry.is_empty() {
        tracing::warn!("no languages enabled; check compiler_paths in the configuration");
    }

    for language in registry.languages() {
        println!("{language}");
    }
    Ok(())
}

use clap::Parser;
use codeon::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    if let Err(e) = codeon_utils::tracing::init() {
        eprintln!("codeon: failed to initialise logging: {e}");
    }
    codeon_utils::init_cleanup_handler();

    let loaded = cli.config_loader().load()?;
    tracing::debug!(source = ?loaded.source, "using configuration");

    cli.command.execute(loaded.config).await
}

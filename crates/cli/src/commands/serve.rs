use codeon_config::EngineConfig;
use codeon_exec::Engine;
use eyre::WrapErr;
use std::net::SocketAddr;

pub async fn execute(config: &EngineConfig, addr: SocketAddr) -> eyre::Result<()> {
    let engine = Engine::new(config)?;
    tracing::info!(
        languages = ?engine.languages(),
        timeout_secs = config.execution_timeout,
        "starting HTTP adapter"
    );

    crate::server::serve(engine, addr)
        .await
        .wrap_err_with(|| format!("HTTP server on {addr} failed"))
}

//! JSON-over-HTTP adapter
//!
//! `POST /api/run` takes `{ "code", "language", "input" }` and answers with
//! `{ stdout, stderr, success, duration, memory, files }`.
//! `GET /api/languages` lists the enabled languages.

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use codeon_exec::Engine;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the axum router
pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/api/run", post(handlers::handle_run))
        .route("/api/languages", get(handlers::handle_languages))
        .with_state(engine)
}

/// Bind and serve until the process is stopped
pub async fn serve(engine: Engine, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "listening");
    axum::serve(listener, router(engine)).await
}

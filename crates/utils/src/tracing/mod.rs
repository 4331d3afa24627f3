use codeon_core::CODEON_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter comes from `RUST_LOG`, then `CODEON_LOG`, then defaults to
/// `info`. Output always goes to stderr so stdout stays reserved for program
/// output and JSON results.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = resolve_filter(
        std::env::var("RUST_LOG").ok(),
        std::env::var(CODEON_LOG_VAR).ok(),
    );

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn resolve_filter(rust_log: Option<String>, codeon_log: Option<String>) -> EnvFilter {
    rust_log
        .into_iter()
        .chain(codeon_log)
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one engine execution
pub fn execution_span(language: &str, cache_key: &str) -> Span {
    span!(Level::INFO, "execute", language = %language, cache_key = %cache_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let filter = resolve_filter(Some("debug".into()), Some("error".into()));
        assert_eq!(filter.to_string(), "debug");

        let filter = resolve_filter(None, Some("codeon_exec=trace".into()));
        assert_eq!(filter.to_string(), "codeon_exec=trace");

        let filter = resolve_filter(None, None);
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_invalid_directive_falls_through() {
        let filter = resolve_filter(Some("codeon=bogus".into()), Some("warn".into()));
        assert_eq!(filter.to_string(), "warn");
    }
}

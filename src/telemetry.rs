use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter for the configured level; `RUST_LOG` wins when set.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

fn default_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        "info".to_string()
    } else {
        // keep axum/hyper internals quiet unless asked for
        format!("{level},hyper=warn,tower_http=warn")
    }
}

/// Installs the global subscriber. Calling it again is a no-op, so tests and
/// the CLI can both call it.
pub fn init_logging(level: &str) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .try_init();
}

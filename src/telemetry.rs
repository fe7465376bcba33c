use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use major_bracket::config::ServerConfig;

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_tracing(server: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if server.is_production() {
        registry
            .with(fmt::layer().with_target(false).with_ansi(false).json())
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

// Logs go to stderr; `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_JSON: &str = "WALLET_GATE_LOG_JSON";

/// stderr subscriber, `RUST_LOG` filter (default `info`), JSON with `WALLET_GATE_LOG_JSON=1`.
pub fn init_logging() { init_logging_with("info") }

pub fn init_logging_with(default_directive: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let use_json = std::env::var(ENV_LOG_JSON).map(|value| value == "1").unwrap_or(false);

    let builder = fmt::Subscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr);
    // try_init: tests and embedding hosts may have installed one already
    let _ = if use_json { builder.json().try_init() } else { builder.compact().try_init() };
}

//! Observability setup.
//!
//! Logs go to stderr without ANSI colours. `RUST_LOG` wins over the
//! configured filter; `LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

use crate::api::config::{ApiConfig, LogFormat};

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(config: &ApiConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
}

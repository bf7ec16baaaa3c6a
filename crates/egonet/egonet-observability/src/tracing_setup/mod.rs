//! Tracing setup: structured logging with span definitions.

pub mod spans;

use tracing_subscriber::EnvFilter;

use egonet_core::config::ObservabilityConfig;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV_VAR: &str = "EGONET_LOG";

/// Install the global subscriber.
///
/// `EGONET_LOG` wins over `config.log_level`. Returns `false` if a global
/// subscriber was already installed, e.g. by the embedding application.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

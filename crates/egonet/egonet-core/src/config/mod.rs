pub mod defaults;
mod network_config;
mod observability_config;
mod tie_strength_config;

pub use network_config::{NetworkConfig, PopularityConfig};
pub use observability_config::ObservabilityConfig;
pub use tie_strength_config::{DecayKernel, TieStrengthConfig};

use serde::{Deserialize, Serialize};

use crate::errors::{EgoNetError, EgoNetResult};

/// Complete configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoNetConfig {
    pub tie_strength: TieStrengthConfig,
    pub network: NetworkConfig,
    pub popularity: PopularityConfig,
    pub observability: ObservabilityConfig,
}

impl EgoNetConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(source: &str) -> EgoNetResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| EgoNetError::ConfigError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tunables the scoring engines cannot work with.
    pub fn validate(&self) -> EgoNetResult<()> {
        self.tie_strength
            .validate()
            .map_err(|reason| EgoNetError::ConfigError { reason })?;
        if self.network.weak_edge_threshold < 0.0 {
            return Err(EgoNetError::ConfigError {
                reason: "network.weak_edge_threshold cannot be negative".into(),
            });
        }
        if self.network.inactive_node_threshold < 0.0 {
            return Err(EgoNetError::ConfigError {
                reason: "network.inactive_node_threshold cannot be negative".into(),
            });
        }
        if !(self.popularity.scale_toggles_per_day > 0.0) {
            return Err(EgoNetError::ConfigError {
                reason: "popularity.scale_toggles_per_day must be positive".into(),
            });
        }
        Ok(())
    }
}

//! Plugin Configuration - built by the host, optionally from the environment

use std::time::Duration;

use crate::core::Space;
use crate::wallet::{AdapterConfig, DEFAULT_REQUEST_TIMEOUT};

pub const ENV_REQUEST_TIMEOUT_MS: &str = "WALLET_GATE_REQUEST_TIMEOUT_MS";
pub const ENV_SPACES: &str = "WALLET_GATE_SPACES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Deadline applied to every provider request of every adapter.
    pub request_timeout: Duration,
    /// Spaces offered to the player, in menu order.
    pub spaces: Vec<Space>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT, spaces: Space::ALL.to_vec() }
    }
}

impl PluginConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self { self.request_timeout = timeout; self }
    pub fn with_spaces(mut self, spaces: Vec<Space>) -> Self { self.spaces = spaces; self }

    /// Defaults overridden by `WALLET_GATE_REQUEST_TIMEOUT_MS` and
    /// `WALLET_GATE_SPACES` (comma separated, e.g. `espace,core`).
    pub fn from_env() -> Self { Self::from_vars(|key| std::env::var(key).ok()) }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.request_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!(var = ENV_REQUEST_TIMEOUT_MS, value = %raw, "ignoring invalid timeout"),
            }
        }
        if let Some(raw) = lookup(ENV_SPACES) {
            let mut spaces = Vec::new();
            for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match part.parse::<Space>() {
                    Ok(space) if !spaces.contains(&space) => spaces.push(space),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(var = ENV_SPACES, error = %e, "ignoring unknown space"),
                }
            }
            if !spaces.is_empty() {
                config.spaces = spaces;
            }
        }
        config
    }

    /// Built-in adapters for the configured spaces, in space order.
    pub fn adapters(&self) -> Vec<AdapterConfig> {
        self.spaces
            .iter()
            .flat_map(|space| AdapterConfig::builtin().into_iter().filter(move |a| a.space == *space))
            .map(|a| a.with_request_timeout(self.request_timeout))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProviderKind;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.spaces, vec![Space::Native, Space::Evm]);
        assert_eq!(config.adapters().len(), 3);
    }

    #[test]
    fn env_overrides() {
        let config = PluginConfig::from_vars(vars(&[(ENV_REQUEST_TIMEOUT_MS, "1500"), (ENV_SPACES, "espace, evm")]));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.spaces, vec![Space::Evm]);

        let adapters = config.adapters();
        assert_eq!(adapters.iter().map(|a| a.provider).collect::<Vec<_>>(), vec![ProviderKind::Fluent, ProviderKind::MetaMask]);
        assert!(adapters.iter().all(|a| a.request_timeout == Duration::from_millis(1500)));
    }

    #[test]
    fn invalid_env_keeps_defaults() {
        let config = PluginConfig::from_vars(vars(&[(ENV_REQUEST_TIMEOUT_MS, "soon"), (ENV_SPACES, "moon")]));
        assert_eq!(config, PluginConfig::default());
    }
}

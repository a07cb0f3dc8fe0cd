use serde::Serialize;
use std::time::Duration;

use super::client::RpcDialect;
use super::provider::ProviderProbe;
use crate::core::chain::ChainDescriptor;
use crate::core::units::Units;
use crate::core::{ProviderKind, Space};

/// Upper bound on any single provider request (popups included).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything that distinguishes one wallet adapter from another.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub provider: ProviderKind,
    pub space: Space,
    #[serde(skip)]
    pub probe: ProviderProbe,
    pub chain: ChainDescriptor,
    pub dialect: RpcDialect,
    #[serde(skip)]
    pub units: Units,
    #[serde(skip)]
    pub request_timeout: Duration,
}

impl AdapterConfig {
    /// Fluent on Conflux Core (`window.conflux`).
    pub fn fluent_core() -> Self {
        let chain = ChainDescriptor::conflux_core();
        Self {
            provider: ProviderKind::Fluent,
            space: Space::Native,
            probe: ProviderProbe::new("conflux", "isFluent"),
            units: Units::new(chain.native_currency.decimals),
            chain,
            dialect: RpcDialect::ConfluxCore,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Fluent on Conflux eSpace (`window.fluent`).
    pub fn fluent_espace() -> Self {
        let chain = ChainDescriptor::conflux_espace();
        Self {
            provider: ProviderKind::Fluent,
            space: Space::Evm,
            probe: ProviderProbe::new("fluent", "isFluent"),
            units: Units::new(chain.native_currency.decimals),
            chain,
            dialect: RpcDialect::Evm,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// MetaMask on Conflux eSpace (`window.ethereum`).
    pub fn metamask_espace() -> Self {
        Self {
            provider: ProviderKind::MetaMask,
            probe: ProviderProbe::new("ethereum", "isMetaMask"),
            ..Self::fluent_espace()
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::fluent_core(), Self::fluent_espace(), Self::metamask_espace()]
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_chain(mut self, chain: ChainDescriptor) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_both_spaces() {
        let all = AdapterConfig::builtin();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].space, Space::Native);
        assert_eq!(all[0].chain.id, 1029);
        assert_eq!(all[0].dialect, RpcDialect::ConfluxCore);
        assert_eq!(all[2].provider, ProviderKind::MetaMask);
        assert_eq!(all[2].probe, ProviderProbe::new("ethereum", "isMetaMask"));
        assert_eq!(all[2].chain.id, 1030);
        assert!(all.iter().all(|c| c.request_timeout == DEFAULT_REQUEST_TIMEOUT));
    }

    #[test]
    fn builders_override() {
        let config = AdapterConfig::fluent_espace()
            .with_request_timeout(Duration::from_millis(250))
            .with_units(Units::new(6));
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.units, Units::new(6));
    }
}

//! Shared vocabulary: chain spaces, wallet products, chain descriptors, units, topic names.

pub mod chain;
pub mod topics;
pub mod units;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain family the user picks before picking a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    /// Conflux Core (base32 `cfx:` addresses, `cfx_*` RPC).
    #[serde(rename = "core")]
    Native,
    /// Conflux eSpace (EVM-compatible, `eth_*` RPC).
    #[serde(rename = "espace")]
    Evm,
}

impl Space {
    pub const ALL: [Space; 2] = [Space::Native, Space::Evm];

    pub fn as_str(&self) -> &'static str {
        match self { Space::Native => "core", Space::Evm => "espace" }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Space {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "core" | "native" => Ok(Space::Native),
            "espace" | "evm" => Ok(Space::Evm),
            other => Err(format!("unknown space: {other}")),
        }
    }
}

/// Wallet product injected by a browser extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Fluent,
    MetaMask,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Fluent, ProviderKind::MetaMask];

    pub fn name(&self) -> &'static str {
        match self { ProviderKind::Fluent => "Fluent", ProviderKind::MetaMask => "MetaMask" }
    }

    /// Provider-scoped error topic, e.g. `fluentError`.
    pub fn error_topic(&self) -> &'static str {
        match self {
            ProviderKind::Fluent => topics::FLUENT_ERROR,
            ProviderKind::MetaMask => topics::METAMASK_ERROR,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fluent" => Ok(ProviderKind::Fluent),
            "metamask" => Ok(ProviderKind::MetaMask),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

//! Statically known chain metadata, returned by `get_chain_info`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn cfx() -> Self {
        Self { name: "Conflux".into(), symbol: "CFX".into(), decimals: 18 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub network: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
}

impl ChainDescriptor {
    /// Conflux Core mainnet (chain id 1029).
    pub fn conflux_core() -> Self {
        Self {
            id: 1029,
            name: "Conflux Core".into(),
            network: "mainnet".into(),
            native_currency: NativeCurrency::cfx(),
            rpc_url: "https://main.confluxrpc.com".into(),
            explorer_url: Some("https://confluxscan.io".into()),
        }
    }

    /// Conflux eSpace mainnet (chain id 1030).
    pub fn conflux_espace() -> Self {
        Self {
            id: 1030,
            name: "Conflux eSpace".into(),
            network: "cfx-espace".into(),
            native_currency: NativeCurrency::cfx(),
            rpc_url: "https://evm.confluxrpc.com".into(),
            explorer_url: Some("https://evm.confluxscan.io".into()),
        }
    }

    /// `0x`-prefixed chain id as wallets expect it in `wallet_switch*Chain`.
    pub fn hex_id(&self) -> String { format!("0x{:x}", self.id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_chain_ids() {
        assert_eq!(ChainDescriptor::conflux_core().id, 1029);
        assert_eq!(ChainDescriptor::conflux_espace().hex_id(), "0x406");
    }

    #[test]
    fn serializes_camel_case() {
        let v = serde_json::to_value(ChainDescriptor::conflux_espace()).unwrap();
        assert_eq!(v["nativeCurrency"]["symbol"], "CFX");
        assert_eq!(v["id"], 1030);
    }
}

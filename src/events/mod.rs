//! Notification Channel: topic-keyed publish/subscribe between the wallet core
//! and its consumers (UI panels, game scenes).
//!
//! ```text
//! adapter / plugin ──notify(WalletEvent)──▶ EventBus ──▶ handler 1 (registration order)
//!                                              │      ──▶ handler 2
//!                                              │      ──▶ ...
//!                                              └─ a failing handler is logged, the rest still run
//! ```
//!
//! The bus is a plain value handed to whoever needs it; there is no global
//! instance. Adapters only see the narrow [`Notifier`] seam so tests can swap in
//! an [`EventRecorder`].

mod bus;
mod recorder;

pub use bus::{ContextId, Delivery, EventBus, Handler, HandlerId};
pub use recorder::EventRecorder;

use crate::core::{topics, ProviderKind};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::str::FromStr;

/// Anything that can publish wallet notifications.
pub trait Notifier {
    fn notify(&self, event: WalletEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    WalletConnected,
    WalletDisconnected,
    AccountChanged,
    ChainChanged,
    BalanceUpdated,
    BlockNumberUpdated,
    TransactionSent,
    ProviderError(ProviderKind),
    PluginError,
}

impl Topic {
    pub fn all() -> Vec<Topic> {
        let mut all = vec![
            Topic::WalletConnected,
            Topic::WalletDisconnected,
            Topic::AccountChanged,
            Topic::ChainChanged,
            Topic::BalanceUpdated,
            Topic::BlockNumberUpdated,
            Topic::TransactionSent,
        ];
        all.extend(ProviderKind::ALL.iter().map(|p| Topic::ProviderError(*p)));
        all.push(Topic::PluginError);
        all
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topic::WalletConnected => topics::WALLET_CONNECTED,
            Topic::WalletDisconnected => topics::WALLET_DISCONNECTED,
            Topic::AccountChanged => topics::ACCOUNT_CHANGED,
            Topic::ChainChanged => topics::CHAIN_CHANGED,
            Topic::BalanceUpdated => topics::BALANCE_UPDATED,
            Topic::BlockNumberUpdated => topics::BLOCK_NUMBER_UPDATED,
            Topic::TransactionSent => topics::TRANSACTION_SENT,
            Topic::ProviderError(provider) => provider.error_topic(),
            Topic::PluginError => topics::PLUGIN_ERROR,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Topic::all()
            .into_iter()
            .find(|t| t.name() == value)
            .ok_or_else(|| format!("unknown topic: {value}"))
    }
}

/// One notification. Each variant is one topic with its fixed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    WalletConnected { account: String, chain_id: u64 },
    WalletDisconnected,
    AccountChanged { account: String },
    ChainChanged { chain_id: u64 },
    BalanceUpdated { balance: String },
    BlockNumberUpdated { block_number: u64 },
    TransactionSent { hash: String },
    ProviderError { provider: ProviderKind, message: String },
    PluginError { message: String },
}

impl WalletEvent {
    pub fn topic(&self) -> Topic {
        match self {
            WalletEvent::WalletConnected { .. } => Topic::WalletConnected,
            WalletEvent::WalletDisconnected => Topic::WalletDisconnected,
            WalletEvent::AccountChanged { .. } => Topic::AccountChanged,
            WalletEvent::ChainChanged { .. } => Topic::ChainChanged,
            WalletEvent::BalanceUpdated { .. } => Topic::BalanceUpdated,
            WalletEvent::BlockNumberUpdated { .. } => Topic::BlockNumberUpdated,
            WalletEvent::TransactionSent { .. } => Topic::TransactionSent,
            WalletEvent::ProviderError { provider, .. } => Topic::ProviderError(*provider),
            WalletEvent::PluginError { .. } => Topic::PluginError,
        }
    }

    /// Error message carried by `<provider>Error` / `pluginError`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            WalletEvent::ProviderError { message, .. } | WalletEvent::PluginError { message } => Some(message),
            _ => None,
        }
    }
}

// {"topic": "walletConnected", "account": "0x..", "chainId": 1030}
impl Serialize for WalletEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("topic", self.topic().name())?;
        match self {
            WalletEvent::WalletConnected { account, chain_id } => {
                map.serialize_entry("account", account)?;
                map.serialize_entry("chainId", chain_id)?;
            }
            WalletEvent::WalletDisconnected => {}
            WalletEvent::AccountChanged { account } => map.serialize_entry("account", account)?,
            WalletEvent::ChainChanged { chain_id } => map.serialize_entry("chainId", chain_id)?,
            WalletEvent::BalanceUpdated { balance } => map.serialize_entry("balance", balance)?,
            WalletEvent::BlockNumberUpdated { block_number } => map.serialize_entry("blockNumber", block_number)?,
            WalletEvent::TransactionSent { hash } => map.serialize_entry("hash", hash)?,
            WalletEvent::ProviderError { provider, message } => {
                map.serialize_entry("provider", provider.name())?;
                map.serialize_entry("message", message)?;
            }
            WalletEvent::PluginError { message } => map.serialize_entry("message", message)?,
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn topic_names_round_trip() {
        for topic in Topic::all() {
            assert_eq!(topic.name().parse::<Topic>().unwrap(), topic);
        }
        assert!("current-scene-ready".parse::<Topic>().is_err());
    }

    #[test]
    fn provider_error_topic_is_scoped() {
        let ev = WalletEvent::ProviderError { provider: ProviderKind::MetaMask, message: "x".into() };
        assert_eq!(ev.topic().name(), "metaMaskError");
        assert_eq!(ev.error_message(), Some("x"));
    }

    #[test]
    fn events_serialize_with_topic_tag() {
        let ev = WalletEvent::WalletConnected { account: "0xabc".into(), chain_id: 1030 };
        assert_eq!(
            serde_json::to_value(&ev).unwrap(),
            json!({"topic": "walletConnected", "account": "0xabc", "chainId": 1030})
        );
        assert_eq!(
            serde_json::to_value(WalletEvent::WalletDisconnected).unwrap(),
            json!({"topic": "walletDisconnected"})
        );
    }
}

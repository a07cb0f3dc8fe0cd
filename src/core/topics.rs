//! Notification topic names
//!
//! The wire contract toward UI and game scenes. Payload shapes are fixed per
//! topic; see [`crate::events::WalletEvent`].

pub const WALLET_CONNECTED: &str = "walletConnected";
pub const WALLET_DISCONNECTED: &str = "walletDisconnected";
pub const ACCOUNT_CHANGED: &str = "accountChanged";
pub const CHAIN_CHANGED: &str = "chainChanged";
pub const BALANCE_UPDATED: &str = "balanceUpdated";
pub const BLOCK_NUMBER_UPDATED: &str = "blockNumberUpdated";
pub const TRANSACTION_SENT: &str = "transactionSent";
pub const PLUGIN_ERROR: &str = "pluginError";

/// Provider-scoped error topics
pub const FLUENT_ERROR: &str = "fluentError";
pub const METAMASK_ERROR: &str = "metaMaskError";

pub const ALL: &[&str] = &[
    WALLET_CONNECTED,
    WALLET_DISCONNECTED,
    ACCOUNT_CHANGED,
    CHAIN_CHANGED,
    BALANCE_UPDATED,
    BLOCK_NUMBER_UPDATED,
    TRANSACTION_SENT,
    FLUENT_ERROR,
    METAMASK_ERROR,
    PLUGIN_ERROR,
];

/// Provider event names on the injected object (`provider.on(name, fn)`).
pub mod provider {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";
}

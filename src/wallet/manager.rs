use async_trait::async_trait;

use super::client::{Block, TransactionReceipt};
use crate::core::chain::ChainDescriptor;
use crate::core::{ProviderKind, Space};

/// What the game may ask of one wallet product on one chain space.
///
/// Failures never surface as return values: the adapter publishes them on its
/// provider error topic and answers `None`.
#[async_trait(?Send)]
pub trait WalletManager {
    fn provider(&self) -> ProviderKind;
    fn space(&self) -> Space;

    /// Whether the injected object was found. Fixed at construction.
    fn is_installed(&self) -> bool;

    /// Request accounts, align the chain, start listening. Returns the account.
    async fn connect(&self) -> Option<String>;

    /// Idempotent. Publishes `walletDisconnected` on every call.
    fn disconnect(&self);

    /// Formatted balance of the connected account.
    async fn get_balance(&self) -> Option<String>;

    /// `amount` is a decimal string in the chain's currency. Returns the hash.
    async fn send_transaction(&self, to: &str, amount: &str) -> Option<String>;

    async fn get_block_number(&self) -> Option<u64>;
    async fn get_block(&self) -> Option<Block>;
    async fn get_transaction_receipt(&self, hash: &str) -> Option<TransactionReceipt>;

    fn get_chain_info(&self) -> ChainDescriptor;
    fn current_account(&self) -> Option<String>;
    fn current_chain_id(&self) -> Option<u64>;
    fn has_listeners(&self) -> bool;

    fn is_connected(&self) -> bool { self.current_account().is_some() }
}

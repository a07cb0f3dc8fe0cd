//! Adapter error taxonomy. Reported on `<provider>Error`, never returned to callers.

use crate::core::units::UnitsError;
use crate::core::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("{provider} is not installed.")]
    NotInstalled { provider: ProviderKind },

    #[error("No accounts found.")]
    NoAccountsReturned,

    #[error("Client not initialized or no account.")]
    ClientNotInitialized,

    #[error("Request {method} failed: {message}")]
    ProviderRequestFailed { method: String, message: String },

    #[error("Switch to chain {chain_id} failed: {message}")]
    ChainSwitchFailed { chain_id: u64, message: String },

    #[error("Request {method} timed out after {after_ms} ms")]
    Timeout { method: String, after_ms: u64 },

    #[error("Malformed {method} response: {message}")]
    MalformedResponse { method: String, message: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),

    #[error("Invalid recipient: {0:?}")]
    InvalidRecipient(String),
}

impl WalletError {
    pub fn malformed(method: &str, message: impl Into<String>) -> Self {
        WalletError::MalformedResponse { method: method.into(), message: message.into() }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;

//! Injected provider boundary
//!
//! A browser wallet extension puts an object on `window` (`window.ethereum`,
//! `window.conflux`, `window.fluent`). Whatever it answers is untrusted: absent
//! objects, odd response shapes and rejected requests are all normal.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::rc::Rc;

use crate::core::topics::provider as names;

/// Rejection from the injected object (`{code, message}` in EIP-1193 terms).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderFailure {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    /// EIP-1193 4001: the user closed or declined the popup.
    pub fn user_rejected(&self) -> bool { self.code == Some(4001) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEventKind::AccountsChanged => names::ACCOUNTS_CHANGED,
            ProviderEventKind::ChainChanged => names::CHAIN_CHANGED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPayload {
    AccountsChanged(Vec<String>),
    /// Raw chain id as the wallet sent it (`"0x406"`, `"1030"`).
    ChainChanged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Listener futures are driven by whoever dispatches provider events.
pub type ProviderListener = Rc<dyn Fn(ProviderPayload) -> LocalBoxFuture<'static, ()>>;

#[async_trait(?Send)]
pub trait InjectedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderFailure>;
    fn on(&self, event: ProviderEventKind, listener: ProviderListener) -> ListenerId;
    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool;
}

/// Where to look for a wallet: `window[global]` with `window[global][flag] === true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProbe {
    pub global: String,
    pub flag: String,
}

impl ProviderProbe {
    pub fn new(global: impl Into<String>, flag: impl Into<String>) -> Self {
        Self { global: global.into(), flag: flag.into() }
    }
}

pub trait ProviderDetector {
    fn detect(&self, probe: &ProviderProbe) -> Option<Rc<dyn InjectedProvider>>;
}

/// Both change listeners installed by one successful connect.
pub struct ListenerSubscription {
    provider: Rc<dyn InjectedProvider>,
    accounts: ListenerId,
    chain: ListenerId,
}

impl ListenerSubscription {
    pub fn install(provider: Rc<dyn InjectedProvider>, on_accounts: ProviderListener, on_chain: ProviderListener) -> Self {
        let accounts = provider.on(ProviderEventKind::AccountsChanged, on_accounts);
        let chain = provider.on(ProviderEventKind::ChainChanged, on_chain);
        Self { provider, accounts, chain }
    }

    pub fn remove(self) {
        self.provider.remove_listener(ProviderEventKind::AccountsChanged, self.accounts);
        self.provider.remove_listener(ProviderEventKind::ChainChanged, self.chain);
    }
}

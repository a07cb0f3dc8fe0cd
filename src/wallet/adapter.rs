//! `InjectedWalletManager`: one adapter, parametrized by `AdapterConfig`,
//! covering Fluent on Core, Fluent on eSpace and MetaMask on eSpace.
//!
//! State lives behind `Rc<RefCell<_>>` shared with the provider listeners,
//! which only hold a `Weak` so a dropped adapter never reacts to events.
//! Every connect attempt and every disconnect bumps an epoch; code resuming
//! after an await compares epochs before touching state or publishing.

use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

use super::client::{
    Block, PublicClient, RpcPublicClient, RpcTransport, RpcWalletClient, TransactionReceipt, WalletClient,
};
use super::config::AdapterConfig;
use super::error::{WalletError, WalletResult};
use super::manager::WalletManager;
use super::provider::{
    InjectedProvider, ListenerSubscription, ProviderDetector, ProviderListener, ProviderPayload,
};
use crate::core::chain::ChainDescriptor;
use crate::core::topics;
use crate::core::units::parse_u64_quantity;
use crate::core::{ProviderKind, Space};
use crate::events::{Notifier, WalletEvent};

#[derive(Debug, Clone)]
struct Session {
    account: String,
    chain_id: u64,
}

#[derive(Default)]
struct Connection {
    session: Option<Session>,
    public: Option<Rc<dyn PublicClient>>,
    wallet: Option<Rc<dyn WalletClient>>,
    listeners: Option<ListenerSubscription>,
    epoch: u64,
}

struct AdapterCore {
    config: AdapterConfig,
    provider: Option<Rc<dyn InjectedProvider>>,
    notifier: Rc<dyn Notifier>,
    state: RefCell<Connection>,
}

pub struct InjectedWalletManager {
    core: Rc<AdapterCore>,
}

impl InjectedWalletManager {
    /// `provider: None` builds an adapter that reports "not installed" forever.
    pub fn new(config: AdapterConfig, provider: Option<Rc<dyn InjectedProvider>>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            core: Rc::new(AdapterCore { config, provider, notifier, state: RefCell::new(Connection::default()) }),
        }
    }

    /// Resolve the injected object once, at construction.
    pub fn detect(config: AdapterConfig, detector: &dyn ProviderDetector, notifier: Rc<dyn Notifier>) -> Self {
        let provider = detector.detect(&config.probe);
        debug!(
            provider = %config.provider,
            space = %config.space,
            global = %config.probe.global,
            installed = provider.is_some(),
            "probed injected provider"
        );
        Self::new(config, provider, notifier)
    }

    pub fn config(&self) -> &AdapterConfig { &self.core.config }
}

impl AdapterCore {
    fn emit(&self, event: WalletEvent) { self.notifier.notify(event); }

    fn report(&self, error: WalletError) {
        warn!(provider = %self.config.provider, space = %self.config.space, %error, "wallet error");
        self.notifier.notify(WalletEvent::ProviderError { provider: self.config.provider, message: error.to_string() });
    }

    fn settle<T>(&self, result: WalletResult<T>) -> Option<T> {
        result.map_err(|e| self.report(e)).ok()
    }

    fn transport(&self, provider: Rc<dyn InjectedProvider>) -> RpcTransport {
        RpcTransport::new(provider, self.config.dialect, self.config.request_timeout)
    }

    fn epoch(&self) -> u64 { self.state.borrow().epoch }

    fn is_current(&self, epoch: u64) -> bool { self.state.borrow().epoch == epoch }

    /// Drops a result whose connection ended while the request was in flight.
    fn still_current<T>(&self, epoch: u64, method: &str, result: WalletResult<T>) -> Option<WalletResult<T>> {
        if self.is_current(epoch) {
            return Some(result);
        }
        debug!(provider = %self.config.provider, method, epoch, "result from an ended connection discarded");
        None
    }

    fn session(&self) -> Option<Session> { self.state.borrow().session.clone() }

    fn reader(&self) -> Option<(Rc<dyn PublicClient>, Option<String>)> {
        let state = self.state.borrow();
        let account = state.session.as_ref().map(|s| s.account.clone());
        state.public.clone().map(|client| (client, account))
    }

    fn writer(&self) -> Option<Rc<dyn WalletClient>> {
        let state = self.state.borrow();
        state.session.as_ref().and(state.wallet.clone())
    }

    /// New epoch; listeners from the previous connection come off first.
    fn begin_attempt(&self) -> (u64, bool) {
        let (epoch, was_connected, old) = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            (state.epoch, state.session.is_some(), state.listeners.take())
        };
        if let Some(old) = old {
            old.remove();
        }
        (epoch, was_connected)
    }

    fn clear(&self) {
        let old = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            state.session = None;
            state.public = None;
            state.wallet = None;
            state.listeners.take()
        };
        if let Some(old) = old {
            old.remove();
        }
    }

    fn disconnect(&self) {
        self.clear();
        info!(provider = %self.config.provider, space = %self.config.space, "wallet disconnected");
        self.emit(WalletEvent::WalletDisconnected);
    }

    async fn connect(self: &Rc<Self>) -> Option<String> {
        let Some(provider) = self.provider.clone() else {
            self.report(WalletError::NotInstalled { provider: self.config.provider });
            return None;
        };
        let (epoch, was_connected) = self.begin_attempt();
        match self.establish(provider, epoch).await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                debug!(provider = %self.config.provider, epoch, "connect attempt superseded");
                None
            }
            Err(error) if self.is_current(epoch) => {
                self.clear();
                if was_connected {
                    self.emit(WalletEvent::WalletDisconnected);
                }
                self.report(error);
                None
            }
            Err(error) => {
                debug!(provider = %self.config.provider, %error, "superseded connect attempt failed");
                None
            }
        }
    }

    /// `Ok(None)` when a later connect or disconnect took over mid-flight.
    async fn establish(self: &Rc<Self>, provider: Rc<dyn InjectedProvider>, epoch: u64) -> WalletResult<Option<String>> {
        let transport = self.transport(provider.clone());
        let method = self.config.dialect.request_accounts();
        let response = transport.call(method, json!([])).await?;
        let account = first_account(method, &response)?.ok_or(WalletError::NoAccountsReturned)?;

        let public: Rc<dyn PublicClient> = Rc::new(RpcPublicClient::new(transport.clone()));
        let wallet: Rc<dyn WalletClient> = Rc::new(RpcWalletClient::new(transport, account.clone()));
        let chain_id = wallet.get_chain_id().await?;
        if !self.is_current(epoch) {
            return Ok(None);
        }

        let subscription = ListenerSubscription::install(provider, self.accounts_listener(), self.chain_listener());
        let replaced = {
            let mut state = self.state.borrow_mut();
            state.session = Some(Session { account: account.clone(), chain_id });
            state.public = Some(public);
            state.wallet = Some(wallet.clone());
            state.listeners.replace(subscription)
        };
        if let Some(replaced) = replaced {
            replaced.remove();
        }

        let target = self.config.chain.id;
        if chain_id != target {
            info!(provider = %self.config.provider, from = chain_id, to = target, "requesting chain switch");
            wallet.switch_chain(target).await?;
            if !self.is_current(epoch) {
                return Ok(None);
            }
            if let Some(session) = self.state.borrow_mut().session.as_mut() {
                session.chain_id = target;
            }
        }

        let chain_id = self.session().map_or(target, |s| s.chain_id);
        info!(provider = %self.config.provider, space = %self.config.space, %account, chain_id, "wallet connected");
        self.emit(WalletEvent::WalletConnected { account: account.clone(), chain_id });
        Ok(Some(account))
    }

    fn accounts_listener(self: &Rc<Self>) -> ProviderListener {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |payload: ProviderPayload| -> LocalBoxFuture<'static, ()> {
            if let (Some(core), ProviderPayload::AccountsChanged(accounts)) = (weak.upgrade(), payload) {
                core.on_accounts_changed(accounts);
            }
            futures::future::ready(()).boxed_local()
        })
    }

    fn chain_listener(self: &Rc<Self>) -> ProviderListener {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |payload: ProviderPayload| -> LocalBoxFuture<'static, ()> {
            let weak = weak.clone();
            async move {
                if let (Some(core), ProviderPayload::ChainChanged(raw)) = (weak.upgrade(), payload) {
                    core.on_chain_changed(raw).await;
                }
            }
            .boxed_local()
        })
    }

    fn on_accounts_changed(&self, accounts: Vec<String>) {
        if self.session().is_none() {
            return;
        }
        let Some(account) = accounts.into_iter().next() else {
            info!(provider = %self.config.provider, "wallet reported no accounts");
            self.disconnect();
            return;
        };
        let rebound = self
            .provider
            .clone()
            .map(|p| Rc::new(RpcWalletClient::new(self.transport(p), account.clone())) as Rc<dyn WalletClient>);
        {
            let mut state = self.state.borrow_mut();
            if let Some(session) = state.session.as_mut() {
                session.account = account.clone();
            }
            if rebound.is_some() {
                state.wallet = rebound;
            }
        }
        info!(provider = %self.config.provider, %account, "account changed");
        self.emit(WalletEvent::AccountChanged { account });
    }

    async fn on_chain_changed(&self, raw: String) {
        let Some(chain_id) = parse_u64_quantity(&Value::String(raw.clone())) else {
            self.report(WalletError::malformed(topics::provider::CHAIN_CHANGED, format!("unparseable chain id {raw:?}")));
            return;
        };
        let (wallet, epoch) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match state.session.as_mut() {
                Some(session) => {
                    session.chain_id = chain_id;
                    (state.wallet.clone(), state.epoch)
                }
                None => return,
            }
        };
        info!(provider = %self.config.provider, chain_id, "chain changed");

        let target = self.config.chain.id;
        if chain_id != target {
            if let Some(wallet) = wallet {
                let switched = wallet.switch_chain(target).await;
                let Some(switched) = self.still_current(epoch, topics::provider::CHAIN_CHANGED, switched) else {
                    return;
                };
                if let Err(error) = switched {
                    self.report(error);
                }
            }
        }
        self.emit(WalletEvent::ChainChanged { chain_id });
    }
}

impl Drop for AdapterCore {
    fn drop(&mut self) {
        if let Some(listeners) = self.state.get_mut().listeners.take() {
            listeners.remove();
        }
    }
}

/// `Ok(None)` for an empty account list.
fn first_account(method: &str, response: &Value) -> WalletResult<Option<String>> {
    let accounts = response
        .as_array()
        .ok_or_else(|| WalletError::malformed(method, format!("expected an account list, got {response}")))?;
    match accounts.first() {
        None => Ok(None),
        Some(Value::String(account)) if !account.is_empty() => Ok(Some(account.clone())),
        Some(other) => Err(WalletError::malformed(method, format!("not an account: {other}"))),
    }
}

#[async_trait(?Send)]
impl WalletManager for InjectedWalletManager {
    fn provider(&self) -> ProviderKind { self.core.config.provider }

    fn space(&self) -> Space { self.core.config.space }

    fn is_installed(&self) -> bool { self.core.provider.is_some() }

    async fn connect(&self) -> Option<String> { self.core.connect().await }

    fn disconnect(&self) { self.core.disconnect() }

    async fn get_balance(&self) -> Option<String> {
        let core = &self.core;
        let Some((client, Some(account))) = core.reader() else {
            core.report(WalletError::ClientNotInitialized);
            return None;
        };
        let epoch = core.epoch();
        let fetched = client.get_balance(&account).await;
        let wei = core.settle(core.still_current(epoch, "getBalance", fetched)?)?;
        let balance = core.config.units.format(wei);
        debug!(provider = %core.config.provider, %account, %balance, "balance fetched");
        core.emit(WalletEvent::BalanceUpdated { balance: balance.clone() });
        Some(balance)
    }

    async fn send_transaction(&self, to: &str, amount: &str) -> Option<String> {
        let core = &self.core;
        let Some(wallet) = core.writer() else {
            core.report(WalletError::ClientNotInitialized);
            return None;
        };
        let to = to.trim();
        if to.is_empty() {
            core.report(WalletError::InvalidRecipient(to.to_owned()));
            return None;
        }
        let value = core.settle(core.config.units.parse(amount).map_err(WalletError::from))?;
        let hash = core.settle(wallet.send_transaction(to, value).await)?;
        info!(provider = %core.config.provider, %hash, %to, "transaction sent");
        core.emit(WalletEvent::TransactionSent { hash: hash.clone() });
        Some(hash)
    }

    async fn get_block_number(&self) -> Option<u64> {
        let core = &self.core;
        let Some((client, _)) = core.reader() else {
            core.report(WalletError::ClientNotInitialized);
            return None;
        };
        let epoch = core.epoch();
        let fetched = client.get_block_number().await;
        let block_number = core.settle(core.still_current(epoch, "getBlockNumber", fetched)?)?;
        core.emit(WalletEvent::BlockNumberUpdated { block_number });
        Some(block_number)
    }

    async fn get_block(&self) -> Option<Block> {
        let core = &self.core;
        let Some((client, _)) = core.reader() else {
            core.report(WalletError::ClientNotInitialized);
            return None;
        };
        let epoch = core.epoch();
        let fetched = client.get_block().await;
        core.settle(core.still_current(epoch, "getBlock", fetched)?)
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Option<TransactionReceipt> {
        let core = &self.core;
        let Some((client, Some(_))) = core.reader() else {
            core.report(WalletError::ClientNotInitialized);
            return None;
        };
        let epoch = core.epoch();
        let fetched = client.get_transaction_receipt(hash).await;
        core.settle(core.still_current(epoch, "getTransactionReceipt", fetched)?).flatten()
    }

    fn get_chain_info(&self) -> ChainDescriptor { self.core.config.chain.clone() }

    fn current_account(&self) -> Option<String> { self.core.session().map(|s| s.account) }

    fn current_chain_id(&self) -> Option<u64> { self.core.session().map(|s| s.chain_id) }

    fn has_listeners(&self) -> bool { self.core.state.borrow().listeners.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_account_shapes() {
        assert_eq!(first_account("m", &json!(["0xabc", "0xdef"])).unwrap(), Some("0xabc".into()));
        assert_eq!(first_account("m", &json!([])).unwrap(), None);
        assert!(first_account("m", &json!({"accounts": []})).is_err());
        assert!(first_account("m", &json!([42])).is_err());
    }
}

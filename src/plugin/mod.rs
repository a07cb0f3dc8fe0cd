//! Wallet Plugin - the game's single entry point into wallet functionality
//!
//! Owns the adapter registry and tracks the selected space and the active
//! adapter. Operations forward to the active adapter; with none selected they
//! fail with `NoActiveManager`, published on `pluginError` as well.
//!
//! At most one adapter is connected at a time: selecting a different space or
//! provider disconnects the previous adapter first.

mod config;
mod registry;

pub use config::{PluginConfig, ENV_REQUEST_TIMEOUT_MS, ENV_SPACES};
pub use registry::ManagerRegistry;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{info, warn};

use crate::core::chain::ChainDescriptor;
use crate::core::{ProviderKind, Space};
use crate::events::{EventBus, Notifier, WalletEvent};
use crate::wallet::{Block, InjectedWalletManager, ProviderDetector, TransactionReceipt, WalletManager};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    #[error("No {provider} wallet available for space {space}")]
    UnknownProvider { space: String, provider: String },
    #[error("Unknown space {space}")]
    UnknownSpace { space: String },
    #[error("No wallet manager selected")]
    NoActiveManager,
}

pub type PluginResult<T> = Result<T, PluginError>;

pub struct WalletPlugin {
    registry: ManagerRegistry,
    bus: EventBus,
    space: Cell<Option<Space>>,
    active: RefCell<Option<Rc<dyn WalletManager>>>,
}

impl WalletPlugin {
    /// The first registered space starts selected; no provider is.
    pub fn new(registry: ManagerRegistry, bus: EventBus) -> Self {
        let space = registry.spaces().first().copied();
        Self { registry, bus, space: Cell::new(space), active: RefCell::new(None) }
    }

    /// Registers the built-in adapters for `config.spaces`, probing each provider once.
    pub fn from_config(config: &PluginConfig, detector: &dyn ProviderDetector, bus: EventBus) -> Self {
        let notifier: Rc<dyn Notifier> = Rc::new(bus.clone());
        let mut registry = ManagerRegistry::new();
        for adapter in config.adapters() {
            registry.register(Rc::new(InjectedWalletManager::detect(adapter, detector, notifier.clone())));
        }
        info!(spaces = ?registry.spaces(), timeout_ms = config.request_timeout.as_millis() as u64, "wallet plugin ready");
        Self::new(registry, bus)
    }

    pub fn bus(&self) -> &EventBus { &self.bus }

    pub fn registry(&self) -> &ManagerRegistry { &self.registry }

    fn fail(&self, error: PluginError) -> PluginError {
        warn!(%error, "wallet plugin error");
        self.bus.notify(WalletEvent::PluginError { message: error.to_string() });
        error
    }

    fn active(&self) -> PluginResult<Rc<dyn WalletManager>> {
        let active = self.active.borrow().clone();
        active.ok_or_else(|| self.fail(PluginError::NoActiveManager))
    }

    fn release_active(&self) {
        let previous = self.active.borrow_mut().take();
        if let Some(previous) = previous {
            if previous.is_connected() {
                info!(provider = %previous.provider(), space = %previous.space(), "disconnecting previous wallet");
                previous.disconnect();
            }
        }
    }

    pub fn set_current_space(&self, space: Space) -> PluginResult<()> {
        if self.registry.providers_for(space).is_empty() {
            return Err(self.fail(PluginError::UnknownSpace { space: space.to_string() }));
        }
        if self.space.get() == Some(space) {
            return Ok(());
        }
        self.release_active();
        self.space.set(Some(space));
        info!(%space, "space selected");
        Ok(())
    }

    /// String form used by UI bindings (`"core"`, `"espace"`).
    pub fn select_space(&self, space: &str) -> PluginResult<()> {
        match space.parse::<Space>() {
            Ok(space) => self.set_current_space(space),
            Err(_) => Err(self.fail(PluginError::UnknownSpace { space: space.to_owned() })),
        }
    }

    pub fn set_current_manager(&self, provider: ProviderKind) -> PluginResult<()> {
        let space = self.space.get();
        let Some(manager) = space.and_then(|space| self.registry.get(space, provider)) else {
            return Err(self.fail(PluginError::UnknownProvider {
                space: space.map_or_else(|| "none".to_owned(), |s| s.to_string()),
                provider: provider.to_string(),
            }));
        };
        let same = self
            .active
            .borrow()
            .as_ref()
            .is_some_and(|m| m.provider() == manager.provider() && m.space() == manager.space());
        if !same {
            self.release_active();
            *self.active.borrow_mut() = Some(manager);
        }
        info!(%provider, space = ?space, "wallet manager selected");
        Ok(())
    }

    /// String form used by UI bindings (`"Fluent"`, `"MetaMask"`).
    pub fn select_manager(&self, provider: &str) -> PluginResult<()> {
        match provider.parse::<ProviderKind>() {
            Ok(provider) => self.set_current_manager(provider),
            Err(_) => Err(self.fail(PluginError::UnknownProvider {
                space: self.space.get().map_or_else(|| "none".to_owned(), |s| s.to_string()),
                provider: provider.to_owned(),
            })),
        }
    }

    pub async fn connect(&self) -> PluginResult<Option<String>> {
        let manager = self.active()?;
        Ok(manager.connect().await)
    }

    pub fn disconnect_wallet(&self) -> PluginResult<()> {
        self.active()?.disconnect();
        Ok(())
    }

    pub async fn get_balance(&self) -> PluginResult<Option<String>> {
        let manager = self.active()?;
        Ok(manager.get_balance().await)
    }

    pub async fn send_transaction(&self, to: &str, amount: &str) -> PluginResult<Option<String>> {
        let manager = self.active()?;
        Ok(manager.send_transaction(to, amount).await)
    }

    pub async fn get_block_number(&self) -> PluginResult<Option<u64>> {
        let manager = self.active()?;
        Ok(manager.get_block_number().await)
    }

    pub async fn get_block(&self) -> PluginResult<Option<Block>> {
        let manager = self.active()?;
        Ok(manager.get_block().await)
    }

    pub async fn get_transaction_receipt(&self, hash: &str) -> PluginResult<Option<TransactionReceipt>> {
        let manager = self.active()?;
        Ok(manager.get_transaction_receipt(hash).await)
    }

    pub fn get_chain_info(&self) -> PluginResult<ChainDescriptor> {
        Ok(self.active()?.get_chain_info())
    }

    pub fn available_spaces(&self) -> Vec<Space> { self.registry.spaces() }

    /// Providers registered for the selected space.
    pub fn available_managers(&self) -> Vec<ProviderKind> {
        self.space.get().map(|space| self.registry.providers_for(space)).unwrap_or_default()
    }

    pub fn current_space(&self) -> Option<Space> { self.space.get() }

    pub fn current_provider(&self) -> Option<ProviderKind> { self.active.borrow().as_ref().map(|m| m.provider()) }

    pub fn current_manager(&self) -> Option<Rc<dyn WalletManager>> { self.active.borrow().clone() }

    pub fn current_account(&self) -> Option<String> {
        self.active.borrow().as_ref().and_then(|m| m.current_account())
    }

    pub fn current_chain_id(&self) -> Option<u64> {
        self.active.borrow().as_ref().and_then(|m| m.current_chain_id())
    }

    pub fn is_connected(&self) -> bool { self.current_account().is_some() }

    /// Whether `provider` is injected for the selected space.
    pub fn is_installed(&self, provider: ProviderKind) -> bool {
        self.space
            .get()
            .and_then(|space| self.registry.get(space, provider))
            .is_some_and(|m| m.is_installed())
    }

    /// Application teardown: the active adapter is disconnected and deselected.
    pub fn shutdown(&self) {
        self.release_active();
        info!("wallet plugin shut down");
    }
}

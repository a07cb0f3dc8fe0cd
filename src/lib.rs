//! wallet-gate: wallet connection core for a wallet-gated browser game.
//!
//! The player picks a chain space, then a wallet product; the game may only
//! start once that wallet is connected. Everything the UI learns arrives as a
//! notification on an `EventBus`.
//!
//! # Architecture
//!
//! ```text
//! WalletPlugin (entry point)
//!   │
//!   ├── ManagerRegistry: (space, provider) → WalletManager
//!   │     ├── (core,   Fluent)   → InjectedWalletManager(fluent_core)
//!   │     ├── (espace, Fluent)   → InjectedWalletManager(fluent_espace)
//!   │     └── (espace, MetaMask) → InjectedWalletManager(metamask_espace)
//!   │                                   │
//!   │                                   └── InjectedProvider (window object / simulated)
//!   │
//!   └── EventBus ──▶ GateStatus, UI handlers, EventRecorder
//! ```
//!
//! # Topics
//!
//! | Topic | Payload |
//! |-------|---------|
//! | `walletConnected` | account, chainId |
//! | `walletDisconnected` | - |
//! | `accountChanged` | account |
//! | `chainChanged` | chainId |
//! | `balanceUpdated` | balance (formatted) |
//! | `blockNumberUpdated` | blockNumber |
//! | `transactionSent` | hash |
//! | `fluentError` / `metaMaskError` | message |
//! | `pluginError` | message |
//!
//! # Features
//!
//! - `native` - tokio request timers, tracing-subscriber output, simulator CLI
//! - `wasm` - injected providers on `window`, `GameWallet` JS bindings
//!
//! # Usage
//!
//! ```ignore
//! use wallet_gate::{EventBus, PluginConfig, ProviderKind, Space, WalletPlugin};
//! use wallet_gate::wasm::WindowDetector;
//!
//! let plugin = WalletPlugin::from_config(&PluginConfig::default(), &WindowDetector, EventBus::new());
//! plugin.set_current_space(Space::Evm)?;
//! plugin.set_current_manager(ProviderKind::MetaMask)?;
//! let account = plugin.connect().await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod core;
pub mod events;
pub mod gate;
pub mod plugin;
pub mod wallet;

// =============================================================================
// Native-only modules (CLI, log output)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use core::chain::ChainDescriptor;
pub use core::{ProviderKind, Space};
pub use events::{EventBus, EventRecorder, Notifier, Topic, WalletEvent};
pub use gate::GateStatus;
pub use plugin::{PluginConfig, PluginError, WalletPlugin};
pub use wallet::{AdapterConfig, InjectedWalletManager, WalletError, WalletManager};

#[cfg(feature = "wasm")]
pub use wasm::{GameWallet, JsInjectedProvider, WindowDetector};

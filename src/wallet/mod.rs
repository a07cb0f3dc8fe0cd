//! Wallet module - browser-injected wallets behind one adapter
//!
//! Each `(space, provider)` pair is an `InjectedWalletManager` built from an
//! `AdapterConfig`. The adapter never talks to `window` directly: it gets an
//! `InjectedProvider` (real JS object under `wasm`, `SimulatedProvider`
//! elsewhere) and publishes everything through a `Notifier`.
//!
//! # Architecture
//!
//! ```text
//! WalletPlugin
//!     │
//!     └── Rc<dyn WalletManager> ── InjectedWalletManager(AdapterConfig)
//!                                        │
//!                    ┌───────────────────┼─────────────────────┐
//!                    ▼                   ▼                     ▼
//!             RpcPublicClient     RpcWalletClient     ListenerSubscription
//!                    └─────────┬─────────┘            (accountsChanged,
//!                              ▼                        chainChanged)
//!                    RpcTransport (timeout)                    │
//!                              └──────────► InjectedProvider ◄─┘
//! ```
//!
//! # Adapters
//!
//! | Config | Probe | Chain | RPC |
//! |--------|-------|-------|-----|
//! | `fluent_core` | `window.conflux.isFluent` | 1029 | `cfx_*` |
//! | `fluent_espace` | `window.fluent.isFluent` | 1030 | `eth_*` |
//! | `metamask_espace` | `window.ethereum.isMetaMask` | 1030 | `eth_*` |
//!
//! Errors go out on `fluentError` / `metaMaskError`; operations answer `None`.

mod adapter;
mod client;
mod config;
mod error;
mod manager;
mod provider;
mod simulated;
mod timeout;

pub use adapter::InjectedWalletManager;
pub use client::{
    Block, PublicClient, RpcDialect, RpcPublicClient, RpcTransport, RpcWalletClient, TransactionReceipt, WalletClient,
};
pub use config::{AdapterConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::{WalletError, WalletResult};
pub use manager::WalletManager;
pub use provider::{
    InjectedProvider, ListenerId, ListenerSubscription, ProviderDetector, ProviderEventKind, ProviderFailure,
    ProviderListener, ProviderPayload, ProviderProbe,
};
pub use simulated::{SimulatedDetector, SimulatedProvider};
pub use timeout::with_timeout;

//! WASM module: wallet plugin in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         GameWallet (JS API)             │
//! │  setCurrentSpace, connect, getBalance,  │
//! │  sendTransaction, on/off, canStart      │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     WalletPlugin + EventBus (core)      │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │  JsInjectedProvider (window.ethereum,   │
//! │  window.conflux, window.fluent)         │
//! └─────────────────────────────────────────┘
//! ```

mod plugin;
mod provider;

pub use plugin::GameWallet;
pub use provider::{JsInjectedProvider, WindowDetector};

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;

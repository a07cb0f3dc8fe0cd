//! GameWallet: the wallet plugin as seen from the game's JavaScript scenes

use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use super::log;
use super::provider::WindowDetector;
use crate::events::{ContextId, EventBus, HandlerId, Topic};
use crate::gate::GateStatus;
use crate::plugin::{PluginConfig, WalletPlugin};

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct GameWallet {
    plugin: Rc<WalletPlugin>,
    gate: GateStatus,
    context: ContextId,
    handlers: RefCell<HashMap<u32, (Topic, HandlerId)>>,
    next_handle: RefCell<u32>,
}

#[wasm_bindgen]
impl GameWallet {
    /// Probe `window` for wallets and build the plugin.
    #[wasm_bindgen(constructor)]
    pub fn new(request_timeout_ms: Option<u32>) -> GameWallet {
        let mut config = PluginConfig::default();
        if let Some(ms) = request_timeout_ms {
            config = config.with_request_timeout(Duration::from_millis(ms as u64));
        }
        let plugin = Rc::new(WalletPlugin::from_config(&config, &WindowDetector, EventBus::new()));
        log!("[GameWallet] spaces: {:?}", plugin.available_spaces());
        let gate = GateStatus::attach(&plugin);
        let context = plugin.bus().new_context();
        Self { plugin, gate, context, handlers: RefCell::new(HashMap::new()), next_handle: RefCell::new(0) }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    #[wasm_bindgen(js_name = "setCurrentSpace")]
    pub fn set_current_space(&self, space: &str) -> bool { self.plugin.select_space(space).is_ok() }

    #[wasm_bindgen(js_name = "setCurrentManager")]
    pub fn set_current_manager(&self, provider: &str) -> bool { self.plugin.select_manager(provider).is_ok() }

    #[wasm_bindgen(js_name = "getAvailableSpaces")]
    pub fn available_spaces(&self) -> Vec<String> {
        self.plugin.available_spaces().iter().map(|s| s.to_string()).collect()
    }

    #[wasm_bindgen(js_name = "getAvailableManagers")]
    pub fn available_managers(&self) -> Vec<String> {
        self.plugin.available_managers().iter().map(|p| p.to_string()).collect()
    }

    #[wasm_bindgen(js_name = "isInstalled")]
    pub fn is_installed(&self, provider: &str) -> bool {
        provider.parse().map(|p| self.plugin.is_installed(p)).unwrap_or(false)
    }

    // =========================================================================
    // WALLET OPERATIONS (null on failure; errors arrive as events)
    // =========================================================================

    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.connect().await.ok().flatten())
    }

    /// `false` when no manager is selected.
    #[wasm_bindgen(js_name = "disconnectWallet")]
    pub fn disconnect_wallet(&self) -> bool { self.plugin.disconnect_wallet().is_ok() }

    #[wasm_bindgen(js_name = "getBalance")]
    pub async fn get_balance(&self) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.get_balance().await.ok().flatten())
    }

    #[wasm_bindgen(js_name = "sendTransaction")]
    pub async fn send_transaction(&self, to: String, amount: String) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.send_transaction(&to, &amount).await.ok().flatten())
    }

    #[wasm_bindgen(js_name = "getBlockNumber")]
    pub async fn get_block_number(&self) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.get_block_number().await.ok().flatten())
    }

    #[wasm_bindgen(js_name = "getBlock")]
    pub async fn get_block(&self) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.get_block().await.ok().flatten())
    }

    #[wasm_bindgen(js_name = "getTransactionReceipt")]
    pub async fn get_transaction_receipt(&self, hash: String) -> Result<JsValue, JsValue> {
        to_js(&self.plugin.get_transaction_receipt(&hash).await.ok().flatten())
    }

    #[wasm_bindgen(js_name = "getChainInfo")]
    pub fn get_chain_info(&self) -> Result<JsValue, JsValue> { to_js(&self.plugin.get_chain_info().ok()) }

    #[wasm_bindgen(js_name = "currentAccount")]
    pub fn current_account(&self) -> Option<String> { self.plugin.current_account() }

    #[wasm_bindgen(js_name = "currentChainId")]
    pub fn current_chain_id(&self) -> Option<f64> { self.plugin.current_chain_id().map(|id| id as f64) }

    // =========================================================================
    // GATE
    // =========================================================================

    #[wasm_bindgen(js_name = "canStart")]
    pub fn can_start(&self) -> bool { self.gate.can_start() }

    #[wasm_bindgen(js_name = "shortAccount")]
    pub fn short_account(&self) -> Option<String> { self.gate.short_account() }

    #[wasm_bindgen]
    pub fn status(&self) -> Result<JsValue, JsValue> { to_js(&self.gate.state()) }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Subscribe `callback(event)` to `topic`. Returns a handle for `off`.
    #[wasm_bindgen]
    pub fn on(&self, topic: &str, callback: js_sys::Function) -> Result<u32, JsValue> {
        let topic: Topic = topic.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let id = self.plugin.bus().on(
            topic,
            move |event| {
                let value = to_js(event).map_err(|e| anyhow::anyhow!("{e:?}"))?;
                callback.call1(&JsValue::NULL, &value).map_err(|e| anyhow::anyhow!("{e:?}"))?;
                Ok(())
            },
            Some(self.context),
        );
        let mut next = self.next_handle.borrow_mut();
        *next += 1;
        self.handlers.borrow_mut().insert(*next, (topic, id));
        Ok(*next)
    }

    /// Without a handle, every callback this wallet registered on `topic` goes.
    #[wasm_bindgen]
    pub fn off(&self, topic: &str, handle: Option<u32>) -> Result<usize, JsValue> {
        let topic: Topic = topic.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let mut handlers = self.handlers.borrow_mut();
        let removed = match handle {
            Some(handle) => match handlers.get(&handle) {
                Some((t, id)) if *t == topic => {
                    let n = self.plugin.bus().off(topic, Some(*id), Some(self.context));
                    handlers.remove(&handle);
                    n
                }
                _ => 0,
            },
            None => {
                handlers.retain(|_, (t, _)| *t != topic);
                self.plugin.bus().off(topic, None, Some(self.context))
            }
        };
        Ok(removed)
    }
}

impl Drop for GameWallet {
    fn drop(&mut self) {
        self.plugin.bus().off_context(self.context);
        self.plugin.shutdown();
    }
}

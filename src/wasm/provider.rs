//! `window.ethereum` / `window.conflux` / `window.fluent` as `InjectedProvider`s.

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::wallet::{
    InjectedProvider, ListenerId, ProviderDetector, ProviderEventKind, ProviderFailure, ProviderListener,
    ProviderPayload, ProviderProbe,
};

type JsListener = Closure<dyn FnMut(JsValue)>;

pub struct JsInjectedProvider {
    object: JsValue,
    listeners: RefCell<Vec<(ListenerId, ProviderEventKind, JsListener)>>,
    next_listener: Cell<u64>,
}

impl JsInjectedProvider {
    pub fn new(object: JsValue) -> Self {
        Self { object, listeners: RefCell::new(Vec::new()), next_listener: Cell::new(0) }
    }

    fn function(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.object, &JsValue::from_str(name)).ok()?.dyn_into::<Function>().ok()
    }

    /// `on`/`removeListener`, falling back to `addListener`/`off`.
    fn listener_fn(&self, primary: &str, fallback: &str) -> Option<Function> {
        self.function(primary).or_else(|| self.function(fallback))
    }
}

/// EIP-1193 rejections look like `{code, message}`; anything else is stringified.
fn js_failure(error: JsValue) -> ProviderFailure {
    let code = Reflect::get(&error, &JsValue::from_str("code")).ok().and_then(|c| c.as_f64()).map(|c| c as i64);
    let message = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"));
    ProviderFailure { code, message }
}

fn js_accounts(value: &JsValue) -> Vec<String> {
    if !js_sys::Array::is_array(value) {
        return Vec::new();
    }
    js_sys::Array::from(value).iter().filter_map(|item| item.as_string()).collect()
}

fn js_chain_id(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.as_f64().map(|n| format!("{}", n as u64)))
        .unwrap_or_default()
}

#[async_trait(?Send)]
impl InjectedProvider for JsInjectedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderFailure> {
        let request = self.function("request").ok_or_else(|| ProviderFailure::message("provider has no request()"))?;

        let args = Object::new();
        let params = params
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| ProviderFailure::message(e.to_string()))?;
        Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method)).map_err(js_failure)?;
        Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_failure)?;

        let result = request.call1(&self.object, &args).map_err(js_failure)?;
        let result = match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(js_failure)?,
            Err(plain) => plain,
        };
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderFailure::message(format!("{method}: {e}")))
    }

    fn on(&self, event: ProviderEventKind, listener: ProviderListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let callback: JsListener = Closure::new(move |value: JsValue| {
            let payload = match event {
                ProviderEventKind::AccountsChanged => ProviderPayload::AccountsChanged(js_accounts(&value)),
                ProviderEventKind::ChainChanged => ProviderPayload::ChainChanged(js_chain_id(&value)),
            };
            wasm_bindgen_futures::spawn_local(listener(payload));
        });

        match self.listener_fn("on", "addListener") {
            Some(on) => {
                if let Err(e) = on.call2(&self.object, &JsValue::from_str(event.as_str()), callback.as_ref().unchecked_ref()) {
                    log!("[wallet] registering {} failed: {:?}", event.as_str(), e);
                }
            }
            None => log!("[wallet] provider has no on(); {} not observed", event.as_str()),
        }
        self.listeners.borrow_mut().push((id, event, callback));
        id
    }

    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(lid, kind, _)| *lid == id && *kind == event)
                .map(|index| listeners.remove(index))
        };
        let Some((_, _, callback)) = removed else { return false };
        if let Some(off) = self.listener_fn("removeListener", "off") {
            if let Err(e) = off.call2(&self.object, &JsValue::from_str(event.as_str()), callback.as_ref().unchecked_ref()) {
                log!("[wallet] removing {} failed: {:?}", event.as_str(), e);
            }
        }
        true
    }
}

/// Looks for `window[global]` with `window[global][flag] === true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowDetector;

impl ProviderDetector for WindowDetector {
    fn detect(&self, probe: &ProviderProbe) -> Option<Rc<dyn InjectedProvider>> {
        let window = web_sys::window()?;
        let object = Reflect::get(&window, &JsValue::from_str(&probe.global)).ok()?;
        if object.is_undefined() || object.is_null() {
            return None;
        }
        let flagged = Reflect::get(&object, &JsValue::from_str(&probe.flag)).ok()?.as_bool() == Some(true);
        flagged.then(|| Rc::new(JsInjectedProvider::new(object)) as Rc<dyn InjectedProvider>)
    }
}

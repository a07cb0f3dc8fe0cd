//! Scripted in-memory wallet, standing in for an injected browser object in
//! tests and the CLI. Answers both `eth_*` and `cfx_*` method families.

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::provider::{
    InjectedProvider, ListenerId, ProviderDetector, ProviderEventKind, ProviderFailure, ProviderListener,
    ProviderPayload, ProviderProbe,
};
use crate::core::units::{parse_u64_quantity, to_hex_quantity};

#[derive(Debug, Default)]
struct Script {
    accounts: Vec<String>,
    chain_id: u64,
    balances: HashMap<String, U256>,
    block_number: u64,
    receipts: HashMap<String, Value>,
    failures: HashMap<String, ProviderFailure>,
    hanging: HashSet<String>,
    requests: Vec<(String, Value)>,
    sent: Vec<Value>,
}

#[derive(Default)]
pub struct SimulatedProvider {
    script: RefCell<Script>,
    listeners: RefCell<Vec<(ListenerId, ProviderEventKind, ProviderListener)>>,
    next_listener: Cell<u64>,
}

impl SimulatedProvider {
    pub fn new() -> Self { Self::default() }

    pub fn with_accounts<I, S>(self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_accounts(accounts);
        self
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.script.borrow_mut().chain_id = chain_id;
        self
    }

    pub fn with_balance(self, account: &str, wei: U256) -> Self {
        self.script.borrow_mut().balances.insert(account.to_ascii_lowercase(), wei);
        self
    }

    pub fn with_block_number(self, block_number: u64) -> Self {
        self.script.borrow_mut().block_number = block_number;
        self
    }

    pub fn with_receipt(self, hash: &str, receipt: Value) -> Self {
        self.script.borrow_mut().receipts.insert(hash.to_owned(), receipt);
        self
    }

    /// `method` is rejected with `{code: 4001, message}`.
    pub fn failing(self, method: &str, message: &str) -> Self {
        self.fail(method, ProviderFailure::new(4001, message));
        self
    }

    /// `method` never answers.
    pub fn hanging(self, method: &str) -> Self {
        self.script.borrow_mut().hanging.insert(method.to_owned());
        self
    }

    pub fn set_accounts<I, S>(&self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.borrow_mut().accounts = accounts.into_iter().map(Into::into).collect();
    }

    pub fn set_chain_id(&self, chain_id: u64) { self.script.borrow_mut().chain_id = chain_id; }

    pub fn fail(&self, method: &str, failure: ProviderFailure) {
        self.script.borrow_mut().failures.insert(method.to_owned(), failure);
    }

    /// From now on `method` is rejected by the user.
    pub fn reject(&self, method: &str) { self.fail(method, ProviderFailure::new(4001, "User rejected the request.")); }

    pub fn recover(&self, method: &str) {
        let mut script = self.script.borrow_mut();
        script.failures.remove(method);
        script.hanging.remove(method);
    }

    pub fn chain_id(&self) -> u64 { self.script.borrow().chain_id }

    /// Method names in request order.
    pub fn requests(&self) -> Vec<String> {
        self.script.borrow().requests.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.script.borrow().requests.iter().filter(|(m, _)| m == method).map(|(_, p)| p.clone()).collect()
    }

    pub fn sent_transactions(&self) -> Vec<Value> { self.script.borrow().sent.clone() }

    pub fn listener_count(&self, event: ProviderEventKind) -> usize {
        self.listeners.borrow().iter().filter(|(_, kind, _)| *kind == event).count()
    }

    /// Fire `accountsChanged` and drive every listener to completion.
    pub async fn emit_accounts_changed<I, S>(&self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accounts: Vec<String> = accounts.into_iter().map(Into::into).collect();
        self.set_accounts(accounts.clone());
        self.dispatch(ProviderEventKind::AccountsChanged, ProviderPayload::AccountsChanged(accounts)).await;
    }

    /// Fire `chainChanged` with a raw id (`"0x1"`, or garbage).
    pub async fn emit_chain_changed(&self, raw: &str) {
        if let Some(id) = parse_u64_quantity(&Value::String(raw.to_owned())) {
            self.set_chain_id(id);
        }
        self.dispatch(ProviderEventKind::ChainChanged, ProviderPayload::ChainChanged(raw.to_owned())).await;
    }

    async fn dispatch(&self, event: ProviderEventKind, payload: ProviderPayload) {
        let targets: Vec<ProviderListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in targets {
            listener(payload.clone()).await;
        }
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, ProviderFailure> {
        let mut script = self.script.borrow_mut();
        script.requests.push((method.to_owned(), params.clone()));
        if let Some(failure) = script.failures.get(method) {
            return Err(failure.clone());
        }
        let hex = |n: u64| format!("0x{n:x}");
        let value = match method {
            "eth_requestAccounts" | "cfx_requestAccounts" | "eth_accounts" | "cfx_accounts" => json!(script.accounts),
            "eth_chainId" | "cfx_chainId" => json!(hex(script.chain_id)),
            "eth_getBalance" | "cfx_getBalance" => {
                let account = params.get(0).and_then(Value::as_str).unwrap_or_default().to_ascii_lowercase();
                json!(to_hex_quantity(script.balances.get(&account).copied().unwrap_or_default()))
            }
            "eth_blockNumber" | "cfx_epochNumber" => json!(hex(script.block_number)),
            "eth_getBlockByNumber" | "cfx_getBlockByEpochNumber" => json!({
                "number": hex(script.block_number),
                "epochNumber": hex(script.block_number),
                "hash": format!("0x{:064x}", script.block_number),
                "timestamp": hex(1_700_000_000 + script.block_number),
                "transactions": [],
            }),
            "eth_getTransactionReceipt" | "cfx_getTransactionReceipt" => {
                let hash = params.get(0).and_then(Value::as_str).unwrap_or_default();
                script.receipts.get(hash).cloned().unwrap_or(Value::Null)
            }
            "eth_sendTransaction" | "cfx_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or(Value::Null);
                script.sent.push(tx);
                json!(format!("0x{:064x}", script.sent.len()))
            }
            "wallet_switchEthereumChain" | "wallet_switchConfluxChain" => {
                let target = params.get(0).and_then(|p| p.get("chainId")).and_then(parse_u64_quantity);
                match target {
                    Some(chain_id) => {
                        script.chain_id = chain_id;
                        Value::Null
                    }
                    None => return Err(ProviderFailure::new(-32602, "invalid chainId")),
                }
            }
            other => return Err(ProviderFailure::new(4200, format!("unsupported method {other}"))),
        };
        Ok(value)
    }
}

#[async_trait(?Send)]
impl InjectedProvider for SimulatedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderFailure> {
        let hangs = self.script.borrow().hanging.contains(method);
        if hangs {
            self.script.borrow_mut().requests.push((method.to_owned(), params));
            return futures::future::pending().await;
        }
        self.answer(method, &params)
    }

    fn on(&self, event: ProviderEventKind, listener: ProviderListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, event, listener));
        id
    }

    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, kind, _)| !(*lid == id && *kind == event));
        listeners.len() != before
    }
}

/// Maps probe globals (`"ethereum"`, `"conflux"`, `"fluent"`) to simulated wallets.
#[derive(Default, Clone)]
pub struct SimulatedDetector {
    installed: HashMap<String, Rc<SimulatedProvider>>,
}

impl SimulatedDetector {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, probe: &ProviderProbe, provider: Rc<SimulatedProvider>) -> Self {
        self.installed.insert(probe.global.clone(), provider);
        self
    }
}

impl ProviderDetector for SimulatedDetector {
    fn detect(&self, probe: &ProviderProbe) -> Option<Rc<dyn InjectedProvider>> {
        self.installed.get(&probe.global).map(|p| p.clone() as Rc<dyn InjectedProvider>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_both_method_families() {
        let sim = SimulatedProvider::new().with_accounts(["0xAbC"]).with_chain_id(1).with_block_number(7);
        assert_eq!(sim.request("eth_requestAccounts", json!([])).await.unwrap(), json!(["0xAbC"]));
        assert_eq!(sim.request("cfx_chainId", json!([])).await.unwrap(), json!("0x1"));
        assert_eq!(sim.request("cfx_epochNumber", json!(["latest_state"])).await.unwrap(), json!("0x7"));
        sim.request("wallet_switchEthereumChain", json!([{"chainId": "0x406"}])).await.unwrap();
        assert_eq!(sim.chain_id(), 1030);
        assert_eq!(sim.requests().len(), 4);
    }

    #[tokio::test]
    async fn scripted_failures_and_unknown_methods() {
        let sim = SimulatedProvider::new().failing("eth_requestAccounts", "User rejected the request.");
        let err = sim.request("eth_requestAccounts", json!([])).await.unwrap_err();
        assert!(err.user_rejected());
        assert_eq!(sim.request("eth_mine", json!([])).await.unwrap_err().code, Some(4200));

        sim.recover("eth_requestAccounts");
        assert!(sim.request("eth_requestAccounts", json!([])).await.is_ok());
    }

    #[test]
    fn listeners_register_and_remove() {
        let sim = SimulatedProvider::new();
        let noop: ProviderListener =
            Rc::new(|_: ProviderPayload| -> futures::future::LocalBoxFuture<'static, ()> { Box::pin(async {}) });
        let id = sim.on(ProviderEventKind::ChainChanged, noop);
        assert_eq!(sim.listener_count(ProviderEventKind::ChainChanged), 1);
        assert!(!sim.remove_listener(ProviderEventKind::AccountsChanged, id));
        assert!(sim.remove_listener(ProviderEventKind::ChainChanged, id));
        assert_eq!(sim.listener_count(ProviderEventKind::ChainChanged), 0);
    }
}

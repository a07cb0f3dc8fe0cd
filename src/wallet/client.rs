//! Chain clients bound to an injected provider.
//!
//! `PublicClient` only reads; `WalletClient` is bound to one account and may
//! prompt the user. Both speak through an `RpcTransport` that applies the
//! request deadline and turns provider rejections into `WalletError`s.

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::rc::Rc;
use std::time::Duration;

use super::error::{WalletError, WalletResult};
use super::provider::InjectedProvider;
use super::timeout::with_timeout;
use crate::core::units::{parse_quantity, parse_u64_quantity, to_hex_quantity};

/// RPC method family spoken by the injected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcDialect {
    /// `eth_*`, `wallet_switchEthereumChain`
    Evm,
    /// `cfx_*`, `wallet_switchConfluxChain`, epochs instead of blocks
    ConfluxCore,
}

impl RpcDialect {
    pub fn request_accounts(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_requestAccounts", RpcDialect::ConfluxCore => "cfx_requestAccounts" }
    }

    pub fn chain_id(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_chainId", RpcDialect::ConfluxCore => "cfx_chainId" }
    }

    pub fn balance(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_getBalance", RpcDialect::ConfluxCore => "cfx_getBalance" }
    }

    pub fn block_number(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_blockNumber", RpcDialect::ConfluxCore => "cfx_epochNumber" }
    }

    pub fn latest_block(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_getBlockByNumber", RpcDialect::ConfluxCore => "cfx_getBlockByEpochNumber" }
    }

    pub fn receipt(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_getTransactionReceipt", RpcDialect::ConfluxCore => "cfx_getTransactionReceipt" }
    }

    pub fn send_transaction(&self) -> &'static str {
        match self { RpcDialect::Evm => "eth_sendTransaction", RpcDialect::ConfluxCore => "cfx_sendTransaction" }
    }

    pub fn switch_chain(&self) -> &'static str {
        match self { RpcDialect::Evm => "wallet_switchEthereumChain", RpcDialect::ConfluxCore => "wallet_switchConfluxChain" }
    }

    /// Tag for "most recent state".
    pub fn latest_tag(&self) -> &'static str {
        match self { RpcDialect::Evm => "latest", RpcDialect::ConfluxCore => "latest_state" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block number (eSpace) or epoch number (Core).
    pub number: u64,
    pub hash: Option<String>,
    pub timestamp: Option<u64>,
    pub transaction_count: usize,
}

impl Block {
    pub fn from_value(method: &str, value: &Value) -> WalletResult<Self> {
        if !value.is_object() {
            return Err(WalletError::malformed(method, "expected a block object"));
        }
        let number = ["number", "blockNumber", "epochNumber"]
            .iter()
            .find_map(|key| value.get(*key).and_then(parse_u64_quantity))
            .ok_or_else(|| WalletError::malformed(method, "block without number"))?;
        Ok(Self {
            number,
            hash: value.get("hash").and_then(Value::as_str).map(str::to_owned),
            timestamp: value.get("timestamp").and_then(parse_u64_quantity),
            transaction_count: value.get("transactions").and_then(Value::as_array).map_or(0, Vec::len),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_hash: Option<String>,
    pub block_number: Option<u64>,
    /// `None` when the wallet did not report an outcome.
    pub success: Option<bool>,
}

impl TransactionReceipt {
    pub fn from_value(method: &str, dialect: RpcDialect, value: &Value) -> WalletResult<Self> {
        let transaction_hash = value
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::malformed(method, "receipt without transactionHash"))?
            .to_owned();
        let success = match dialect {
            RpcDialect::Evm => value.get("status").and_then(parse_u64_quantity).map(|s| s == 1),
            // Core reports 0 for success
            RpcDialect::ConfluxCore => value.get("outcomeStatus").and_then(parse_u64_quantity).map(|s| s == 0),
        };
        Ok(Self {
            transaction_hash,
            block_hash: value.get("blockHash").and_then(Value::as_str).map(str::to_owned),
            block_number: ["blockNumber", "epochNumber"].iter().find_map(|key| value.get(*key).and_then(parse_u64_quantity)),
            success,
        })
    }
}

#[async_trait(?Send)]
pub trait PublicClient {
    async fn get_balance(&self, address: &str) -> WalletResult<U256>;
    async fn get_block_number(&self) -> WalletResult<u64>;
    async fn get_block(&self) -> WalletResult<Block>;
    async fn get_transaction_receipt(&self, hash: &str) -> WalletResult<Option<TransactionReceipt>>;
}

#[async_trait(?Send)]
pub trait WalletClient {
    fn account(&self) -> &str;
    async fn get_chain_id(&self) -> WalletResult<u64>;
    async fn switch_chain(&self, chain_id: u64) -> WalletResult<()>;
    async fn send_transaction(&self, to: &str, value: U256) -> WalletResult<String>;
}

#[derive(Clone)]
pub struct RpcTransport {
    provider: Rc<dyn InjectedProvider>,
    dialect: RpcDialect,
    timeout: Duration,
}

impl RpcTransport {
    pub fn new(provider: Rc<dyn InjectedProvider>, dialect: RpcDialect, timeout: Duration) -> Self {
        Self { provider, dialect, timeout }
    }

    pub fn dialect(&self) -> RpcDialect { self.dialect }

    pub async fn call(&self, method: &str, params: Value) -> WalletResult<Value> {
        tracing::debug!(method, "provider request");
        let provider = self.provider.clone();
        with_timeout(method, self.timeout, async move {
            provider.request(method, params).await.map_err(|failure| WalletError::ProviderRequestFailed {
                method: method.to_owned(),
                message: failure.message,
            })
        })
        .await
    }
}

pub struct RpcPublicClient {
    transport: RpcTransport,
}

impl RpcPublicClient {
    pub fn new(transport: RpcTransport) -> Self { Self { transport } }
}

#[async_trait(?Send)]
impl PublicClient for RpcPublicClient {
    async fn get_balance(&self, address: &str) -> WalletResult<U256> {
        let dialect = self.transport.dialect();
        let method = dialect.balance();
        let value = self.transport.call(method, json!([address, dialect.latest_tag()])).await?;
        parse_quantity(&value).ok_or_else(|| WalletError::malformed(method, format!("not a quantity: {value}")))
    }

    async fn get_block_number(&self) -> WalletResult<u64> {
        let dialect = self.transport.dialect();
        let method = dialect.block_number();
        let params = match dialect {
            RpcDialect::Evm => json!([]),
            RpcDialect::ConfluxCore => json!([dialect.latest_tag()]),
        };
        let value = self.transport.call(method, params).await?;
        parse_u64_quantity(&value).ok_or_else(|| WalletError::malformed(method, format!("not a quantity: {value}")))
    }

    async fn get_block(&self) -> WalletResult<Block> {
        let dialect = self.transport.dialect();
        let method = dialect.latest_block();
        let value = self.transport.call(method, json!([dialect.latest_tag(), false])).await?;
        Block::from_value(method, &value)
    }

    async fn get_transaction_receipt(&self, hash: &str) -> WalletResult<Option<TransactionReceipt>> {
        let dialect = self.transport.dialect();
        let method = dialect.receipt();
        let value = self.transport.call(method, json!([hash])).await?;
        if value.is_null() {
            return Ok(None);
        }
        TransactionReceipt::from_value(method, dialect, &value).map(Some)
    }
}

pub struct RpcWalletClient {
    transport: RpcTransport,
    account: String,
}

impl RpcWalletClient {
    pub fn new(transport: RpcTransport, account: impl Into<String>) -> Self {
        Self { transport, account: account.into() }
    }
}

#[async_trait(?Send)]
impl WalletClient for RpcWalletClient {
    fn account(&self) -> &str { &self.account }

    async fn get_chain_id(&self) -> WalletResult<u64> {
        let method = self.transport.dialect().chain_id();
        let value = self.transport.call(method, json!([])).await?;
        parse_u64_quantity(&value).ok_or_else(|| WalletError::malformed(method, format!("not a chain id: {value}")))
    }

    async fn switch_chain(&self, chain_id: u64) -> WalletResult<()> {
        let method = self.transport.dialect().switch_chain();
        let params = json!([{ "chainId": format!("0x{chain_id:x}") }]);
        self.transport
            .call(method, params)
            .await
            .map(|_| ())
            .map_err(|e| WalletError::ChainSwitchFailed { chain_id, message: e.to_string() })
    }

    async fn send_transaction(&self, to: &str, value: U256) -> WalletResult<String> {
        let method = self.transport.dialect().send_transaction();
        let params = json!([{ "from": self.account, "to": to, "value": to_hex_quantity(value) }]);
        let result = self.transport.call(method, params).await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| WalletError::malformed(method, format!("not a transaction hash: {result}")))
    }
}

//! wallet-gate CLI - scripted wallet session against a simulated provider
//!
//! Runs the same plugin the browser build runs, with the injected wallet
//! replaced by a `SimulatedProvider`:
//!   wallet-gate --space espace --provider MetaMask --account 0xabc... --balance-wei 1500000000000000000
//!   wallet-gate --space core --provider Fluent --chain-id 1 --send-to cfx:aa... --amount 0.5
//!   wallet-gate --uninstalled
//!
//! Every notification is printed as it happens, then a session summary.
//!
//! Output format:
//!   --json     One JSON object per line (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use alloy_primitives::U256;
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

use wallet_gate::core::{ProviderKind, Space};
use wallet_gate::events::{EventBus, Topic};
use wallet_gate::logging::init_logging;
use wallet_gate::plugin::{PluginConfig, WalletPlugin};
use wallet_gate::wallet::{AdapterConfig, SimulatedDetector, SimulatedProvider};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }
    if opts.version {
        println!("wallet-gate {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    match run_session(&opts, pretty).await {
        Ok(summary) => println!("{}", render(&json!({ "summary": summary }), pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": e.to_string() }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

#[derive(Default)]
struct ParsedArgs {
    space: Option<String>,
    provider: Option<String>,
    accounts: Vec<String>,
    chain_id: Option<u64>,
    balance_wei: Option<String>,
    block_number: Option<u64>,
    send_to: Option<String>,
    amount: Option<String>,
    fail: Vec<String>,
    hang: Vec<String>,
    uninstalled: bool,
    timeout_ms: Option<u64>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            let next = args.get(i + 1).cloned();
            let mut took_value = true;
            match arg.as_str() {
                "--help" | "-h" => { opts.help = true; took_value = false; }
                "--version" | "-V" => { opts.version = true; took_value = false; }
                "--json" => { opts.json = true; took_value = false; }
                "--pretty" => { opts.pretty = true; took_value = false; }
                "--uninstalled" => { opts.uninstalled = true; took_value = false; }
                "--space" | "-s" => opts.space = next,
                "--provider" | "-p" => opts.provider = next,
                "--account" | "-a" => opts.accounts.extend(next),
                "--chain-id" => opts.chain_id = next.and_then(|s| s.parse().ok()),
                "--balance-wei" => opts.balance_wei = next,
                "--block-number" => opts.block_number = next.and_then(|s| s.parse().ok()),
                "--send-to" => opts.send_to = next,
                "--amount" => opts.amount = next,
                "--fail" => opts.fail.extend(next),
                "--hang" => opts.hang.extend(next),
                "--timeout-ms" => opts.timeout_ms = next.and_then(|s| s.parse().ok()),
                _ => took_value = false, // Ignore unknown flags
            }
            i += if took_value { 2 } else { 1 };
        }
        opts
    }
}

fn print_usage() {
    println!(
        r#"wallet-gate - simulated wallet session

USAGE:
    wallet-gate [options]

SELECTION:
    --space, -s <space>       core | espace (default: first configured space)
    --provider, -p <name>     Fluent | MetaMask (default: first for the space)

SIMULATED WALLET:
    --account, -a <addr>      Account the wallet returns (repeatable; none => zero accounts)
    --chain-id <id>           Chain the wallet starts on (default: target chain)
    --balance-wei <n>         Balance of the first account, smallest unit
    --block-number <n>        Latest block / epoch number
    --fail <method>           Reject this RPC method (repeatable)
    --hang <method>           Never answer this RPC method (repeatable)
    --uninstalled             No injected provider at all

SESSION:
    --send-to <addr>          Send a transaction after connecting
    --amount <decimal>        Amount to send (default: 0)
    --timeout-ms <ms>         Per-request timeout (env: WALLET_GATE_REQUEST_TIMEOUT_MS)

OUTPUT:
    --json                    One JSON object per line
    --pretty                  Pretty-print JSON
"#
    );
}

async fn run_session(opts: &ParsedArgs, pretty: bool) -> anyhow::Result<Value> {
    let mut config = PluginConfig::from_env();
    if let Some(ms) = opts.timeout_ms {
        config = config.with_request_timeout(Duration::from_millis(ms));
    }

    let space = match &opts.space {
        Some(raw) => raw.parse::<Space>().map_err(anyhow::Error::msg)?,
        None => config.spaces.first().copied().ok_or_else(|| anyhow::anyhow!("no spaces configured"))?,
    };
    let provider = match &opts.provider {
        Some(raw) => raw.parse::<ProviderKind>().map_err(anyhow::Error::msg)?,
        None => ProviderKind::Fluent,
    };
    let adapter = AdapterConfig::builtin()
        .into_iter()
        .find(|a| a.space == space && a.provider == provider)
        .ok_or_else(|| anyhow::anyhow!("{provider} is not offered on {space}"))?;

    let sim = Rc::new(simulated_wallet(opts, &adapter)?);
    let detector = if opts.uninstalled {
        SimulatedDetector::new()
    } else {
        SimulatedDetector::new().with(&adapter.probe, sim.clone())
    };

    let bus = EventBus::new();
    for topic in Topic::all() {
        bus.on(topic, move |event| {
            println!("{}", render(&serde_json::to_value(event)?, pretty));
            Ok(())
        }, None);
    }

    let plugin = WalletPlugin::from_config(&config, &detector, bus);
    plugin.set_current_space(space)?;
    plugin.set_current_manager(provider)?;
    info!(%space, %provider, installed = plugin.is_installed(provider), "session starting");

    let account = plugin.connect().await?;
    let mut summary = json!({
        "space": space,
        "provider": provider,
        "installed": plugin.is_installed(provider),
        "account": account,
        "chainId": plugin.current_chain_id(),
        "chain": plugin.get_chain_info()?,
    });

    if account.is_some() {
        summary["balance"] = json!(plugin.get_balance().await?);
        summary["blockNumber"] = json!(plugin.get_block_number().await?);
        summary["latestBlock"] = json!(plugin.get_block().await?);
        if let Some(to) = &opts.send_to {
            let amount = opts.amount.as_deref().unwrap_or("0");
            let hash = plugin.send_transaction(to, amount).await?;
            if let Some(hash) = &hash {
                summary["receipt"] = json!(plugin.get_transaction_receipt(hash).await?);
            }
            summary["transaction"] = json!(hash);
            summary["sent"] = json!(sim.sent_transactions());
        }
        plugin.disconnect_wallet()?;
    }
    debug!(requests = ?sim.requests(), "provider traffic");
    plugin.shutdown();
    Ok(summary)
}

fn simulated_wallet(opts: &ParsedArgs, adapter: &AdapterConfig) -> anyhow::Result<SimulatedProvider> {
    let mut sim = SimulatedProvider::new()
        .with_accounts(opts.accounts.iter().cloned())
        .with_chain_id(opts.chain_id.unwrap_or(adapter.chain.id))
        .with_block_number(opts.block_number.unwrap_or(1));
    if let (Some(raw), Some(first)) = (&opts.balance_wei, opts.accounts.first()) {
        let wei: U256 = raw.parse().map_err(|e| anyhow::anyhow!("invalid --balance-wei {raw}: {e}"))?;
        sim = sim.with_balance(first, wei);
    }
    for method in &opts.fail {
        sim = sim.failing(method, "User rejected the request.");
    }
    for method in &opts.hang {
        sim = sim.hanging(method);
    }
    Ok(sim)
}

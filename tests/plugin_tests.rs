//! Plugin Tests: selection, facade forwarding, the progression gate
//!
//! These tests verify:
//! 1. Registry-driven selection (spaces, providers, unknown pairs)
//! 2. One active adapter: switching space or provider disconnects the old one
//! 3. NoActiveManager handling on every facade operation
//! 4. GateStatus tracks the session purely from notifications
//! 5. A failing UI handler does not starve the others

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;

use wallet_gate::events::{EventBus, EventRecorder, Topic, WalletEvent};
use wallet_gate::gate::GateStatus;
use wallet_gate::plugin::{ManagerRegistry, PluginConfig, PluginError, WalletPlugin};
use wallet_gate::wallet::{
    AdapterConfig, InjectedProvider, InjectedWalletManager, ListenerId, ProviderEventKind, ProviderFailure,
    ProviderListener, SimulatedDetector, SimulatedProvider, WalletManager,
};
use wallet_gate::{ProviderKind, Space};

const ACCOUNT: &str = "0x1234567890abcdef1234567890abcdef12345678";
const CORE_ACCOUNT: &str = "cfx:aak2rra2njvd77ezwjvx04kkds9fzagfe6ku8scz91";

struct Fixture {
    plugin: Rc<WalletPlugin>,
    recorder: EventRecorder,
    metamask: Rc<SimulatedProvider>,
    fluent_core: Rc<SimulatedProvider>,
}

/// MetaMask and Fluent (Core) installed; Fluent on eSpace is not.
fn fixture() -> Fixture {
    let metamask = Rc::new(
        SimulatedProvider::new()
            .with_accounts([ACCOUNT])
            .with_chain_id(1030)
            .with_balance(ACCOUNT, U256::from(2_000_000_000_000_000_000u128)),
    );
    let fluent_core = Rc::new(SimulatedProvider::new().with_accounts([CORE_ACCOUNT]).with_chain_id(1029));
    let detector = SimulatedDetector::new()
        .with(&AdapterConfig::metamask_espace().probe, metamask.clone())
        .with(&AdapterConfig::fluent_core().probe, fluent_core.clone());

    let bus = EventBus::new();
    let recorder = EventRecorder::new();
    recorder.attach(&bus);
    let plugin = Rc::new(WalletPlugin::from_config(&PluginConfig::default(), &detector, bus));
    Fixture { plugin, recorder, metamask, fluent_core }
}

async fn connect_metamask(f: &Fixture) {
    f.plugin.set_current_space(Space::Evm).unwrap();
    f.plugin.set_current_manager(ProviderKind::MetaMask).unwrap();
    assert_eq!(f.plugin.connect().await.unwrap().as_deref(), Some(ACCOUNT));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn registry_drives_the_menus() {
    let f = fixture();
    assert_eq!(f.plugin.available_spaces(), vec![Space::Native, Space::Evm]);
    assert_eq!(f.plugin.current_space(), Some(Space::Native));
    assert_eq!(f.plugin.available_managers(), vec![ProviderKind::Fluent]);

    f.plugin.set_current_space(Space::Evm).unwrap();
    assert_eq!(f.plugin.available_managers(), vec![ProviderKind::Fluent, ProviderKind::MetaMask]);
    assert!(f.plugin.is_installed(ProviderKind::MetaMask));
    assert!(!f.plugin.is_installed(ProviderKind::Fluent));
}

#[test]
fn configured_spaces_limit_the_registry() {
    let config = PluginConfig::default().with_spaces(vec![Space::Evm]);
    let plugin = WalletPlugin::from_config(&config, &SimulatedDetector::new(), EventBus::new());
    assert_eq!(plugin.available_spaces(), vec![Space::Evm]);
    assert_eq!(
        plugin.set_current_space(Space::Native),
        Err(PluginError::UnknownSpace { space: "core".into() })
    );
}

#[test]
fn unknown_provider_keeps_the_active_adapter() {
    let f = fixture();
    f.plugin.set_current_manager(ProviderKind::Fluent).unwrap();

    let err = f.plugin.set_current_manager(ProviderKind::MetaMask).unwrap_err();
    assert_eq!(err, PluginError::UnknownProvider { space: "core".into(), provider: "MetaMask".into() });
    assert_eq!(f.plugin.current_provider(), Some(ProviderKind::Fluent));
    assert_eq!(f.plugin.current_space(), Some(Space::Native));
    assert_eq!(f.recorder.count(Topic::PluginError), 1);
}

#[test]
fn string_selection_for_ui_bindings() {
    let f = fixture();
    f.plugin.select_space("espace").unwrap();
    f.plugin.select_manager("metamask").unwrap();
    assert_eq!(f.plugin.current_provider(), Some(ProviderKind::MetaMask));

    assert!(matches!(f.plugin.select_space("moon"), Err(PluginError::UnknownSpace { .. })));
    assert!(matches!(f.plugin.select_manager("Phantom"), Err(PluginError::UnknownProvider { .. })));
    assert_eq!(f.plugin.current_provider(), Some(ProviderKind::MetaMask));
    assert_eq!(f.recorder.count(Topic::PluginError), 2);
}

// =============================================================================
// Facade
// =============================================================================

#[tokio::test]
async fn every_operation_needs_an_active_manager() {
    let f = fixture();

    assert_eq!(f.plugin.connect().await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.disconnect_wallet(), Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.get_balance().await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.send_transaction(ACCOUNT, "1").await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.get_block_number().await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.get_block().await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.get_transaction_receipt("0x1").await, Err(PluginError::NoActiveManager));
    assert_eq!(f.plugin.get_chain_info(), Err(PluginError::NoActiveManager));

    assert_eq!(f.recorder.count(Topic::PluginError), 8);
    assert!(!f.plugin.is_connected());
    assert_eq!(f.plugin.current_account(), None);
}

#[tokio::test]
async fn facade_forwards_to_the_active_adapter() {
    let f = fixture();
    connect_metamask(&f).await;

    assert!(f.plugin.is_connected());
    assert_eq!(f.plugin.current_chain_id(), Some(1030));
    assert_eq!(f.plugin.get_chain_info().unwrap().id, 1030);
    assert_eq!(f.plugin.get_balance().await.unwrap().as_deref(), Some("2"));
    let hash = f.plugin.send_transaction(ACCOUNT, "0.1").await.unwrap();
    assert!(hash.is_some());
    assert_eq!(f.metamask.sent_transactions().len(), 1);

    f.plugin.disconnect_wallet().unwrap();
    assert!(!f.plugin.is_connected());
    assert_eq!(
        f.recorder.topics(),
        vec!["walletConnected", "balanceUpdated", "transactionSent", "walletDisconnected"]
    );
}

#[tokio::test]
async fn adapter_errors_arrive_on_the_provider_topic() {
    let f = fixture();
    f.plugin.set_current_space(Space::Evm).unwrap();
    f.plugin.set_current_manager(ProviderKind::Fluent).unwrap();

    assert_eq!(f.plugin.connect().await, Ok(None));
    assert_eq!(f.recorder.count(Topic::ProviderError(ProviderKind::Fluent)), 1);
    assert_eq!(f.recorder.count(Topic::PluginError), 0);
}

// =============================================================================
// One active adapter
// =============================================================================

#[tokio::test]
async fn space_switch_disconnects_previous_adapter() {
    let f = fixture();
    connect_metamask(&f).await;
    f.recorder.clear();

    f.plugin.set_current_space(Space::Native).unwrap();

    assert_eq!(f.recorder.events(), vec![WalletEvent::WalletDisconnected]);
    assert_eq!(f.plugin.current_provider(), None);
    let metamask = f.plugin.registry().get(Space::Evm, ProviderKind::MetaMask).unwrap();
    assert!(!metamask.is_connected());
    assert!(!metamask.has_listeners());
}

#[tokio::test]
async fn reselecting_the_same_space_is_a_no_op() {
    let f = fixture();
    connect_metamask(&f).await;
    f.plugin.set_current_space(Space::Evm).unwrap();
    f.plugin.set_current_manager(ProviderKind::MetaMask).unwrap();
    assert!(f.plugin.is_connected());
    assert_eq!(f.recorder.count(Topic::WalletDisconnected), 0);
}

#[tokio::test]
async fn provider_switch_disconnects_previous_adapter() {
    let f = fixture();
    connect_metamask(&f).await;

    f.plugin.set_current_manager(ProviderKind::Fluent).unwrap();
    assert_eq!(f.plugin.current_provider(), Some(ProviderKind::Fluent));
    assert!(!f.plugin.is_connected());
    assert_eq!(f.recorder.count(Topic::WalletDisconnected), 1);
}

#[tokio::test]
async fn core_space_session() {
    let f = fixture();
    f.plugin.set_current_manager(ProviderKind::Fluent).unwrap();
    assert_eq!(f.plugin.connect().await.unwrap().as_deref(), Some(CORE_ACCOUNT));
    assert_eq!(f.plugin.current_chain_id(), Some(1029));
    assert_eq!(f.fluent_core.requests()[0], "cfx_requestAccounts");
}

#[tokio::test]
async fn shutdown_disconnects() {
    let f = fixture();
    connect_metamask(&f).await;
    f.plugin.shutdown();
    assert_eq!(f.plugin.current_provider(), None);
    assert_eq!(f.recorder.last(), Some(WalletEvent::WalletDisconnected));
}

#[cfg(feature = "native")]
#[tokio::test]
async fn configured_timeout_reaches_adapters() {
    let sim = Rc::new(SimulatedProvider::new().with_accounts([ACCOUNT]).hanging("eth_requestAccounts"));
    let detector = SimulatedDetector::new().with(&AdapterConfig::metamask_espace().probe, sim);
    let config = PluginConfig::default().with_request_timeout(Duration::from_millis(10));
    let bus = EventBus::new();
    let recorder = EventRecorder::new();
    recorder.attach(&bus);
    let plugin = WalletPlugin::from_config(&config, &detector, bus);

    plugin.set_current_space(Space::Evm).unwrap();
    plugin.set_current_manager(ProviderKind::MetaMask).unwrap();
    assert_eq!(plugin.connect().await, Ok(None));
    assert_eq!(recorder.count(Topic::ProviderError(ProviderKind::MetaMask)), 1);
}

// =============================================================================
// Gate
// =============================================================================

#[tokio::test]
async fn gate_opens_only_while_connected() {
    let f = fixture();
    let gate = GateStatus::attach(&f.plugin);
    assert!(!gate.can_start());

    connect_metamask(&f).await;
    assert!(gate.can_start());
    assert_eq!(gate.short_account().as_deref(), Some("0x12345...45678"));
    let state = gate.state();
    assert_eq!(state.chain_id, Some(1030));
    assert_eq!(state.chain_name.as_deref(), Some("Conflux eSpace"));

    f.plugin.get_balance().await.unwrap();
    f.plugin.get_block_number().await.unwrap();
    assert_eq!(gate.state().balance.as_deref(), Some("2"));
    assert_eq!(gate.state().block_number, Some(0));

    f.metamask.emit_accounts_changed(Vec::<String>::new()).await;
    assert!(!gate.can_start());
    assert_eq!(gate.state().balance, None);
}

#[tokio::test]
async fn gate_shows_the_latest_error() {
    let f = fixture();
    let gate = GateStatus::attach(&f.plugin);
    f.plugin.connect().await.unwrap_err();
    assert_eq!(gate.state().last_error.as_deref(), Some("No wallet manager selected"));

    connect_metamask(&f).await;
    assert_eq!(gate.state().last_error, None);
}

#[test]
fn gate_detach_drops_its_handlers() {
    let f = fixture();
    let before = f.plugin.bus().listener_count(Topic::WalletConnected);
    let gate = GateStatus::attach(&f.plugin);
    assert_eq!(f.plugin.bus().listener_count(Topic::WalletConnected), before + 1);
    assert_eq!(gate.detach(), Topic::all().len());
    assert_eq!(f.plugin.bus().listener_count(Topic::WalletConnected), before);
}

#[tokio::test]
async fn broken_ui_handler_does_not_block_the_gate() {
    let f = fixture();
    f.plugin.bus().on(Topic::WalletConnected, |_| anyhow::bail!("menu scene not loaded"), None);
    f.plugin.bus().on(Topic::WalletConnected, |_| panic!("panel crashed"), None);
    let gate = GateStatus::attach(&f.plugin);

    connect_metamask(&f).await;
    assert!(gate.can_start());
    assert_eq!(f.recorder.count(Topic::WalletConnected), 1);
}

/// MetaMask wallet whose balance and chain switch answers take 30 ms.
struct SlowMetaMask(Rc<SimulatedProvider>);

#[async_trait(?Send)]
impl InjectedProvider for SlowMetaMask {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderFailure> {
        if matches!(method, "eth_getBalance" | "wallet_switchEthereumChain") {
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        self.0.request(method, params).await
    }

    fn on(&self, event: ProviderEventKind, listener: ProviderListener) -> ListenerId { self.0.on(event, listener) }

    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool { self.0.remove_listener(event, id) }
}

async fn disconnect_soon(plugin: &WalletPlugin) {
    tokio::time::sleep(Duration::from_millis(5)).await;
    plugin.disconnect_wallet().unwrap();
}

#[tokio::test]
async fn gate_stays_empty_when_results_land_after_disconnect() {
    let sim = Rc::new(
        SimulatedProvider::new()
            .with_accounts([ACCOUNT])
            .with_chain_id(1030)
            .with_balance(ACCOUNT, U256::from(2_000_000_000_000_000_000u128)),
    );
    let bus = EventBus::new();
    let recorder = EventRecorder::new();
    recorder.attach(&bus);
    let mut registry = ManagerRegistry::new();
    registry.register(Rc::new(InjectedWalletManager::new(
        AdapterConfig::metamask_espace(),
        Some(Rc::new(SlowMetaMask(sim.clone()))),
        Rc::new(bus.clone()),
    )));
    let plugin = Rc::new(WalletPlugin::new(registry, bus));
    let gate = GateStatus::attach(&plugin);
    plugin.set_current_manager(ProviderKind::MetaMask).unwrap();

    plugin.connect().await.unwrap();
    let (balance, _) = tokio::join!(plugin.get_balance(), disconnect_soon(&plugin));
    assert_eq!(balance, Ok(None));
    assert_eq!(recorder.last(), Some(WalletEvent::WalletDisconnected));
    assert_eq!(gate.state().balance, None);

    plugin.connect().await.unwrap();
    tokio::join!(sim.emit_chain_changed("0x1"), disconnect_soon(&plugin));
    assert_eq!(recorder.last(), Some(WalletEvent::WalletDisconnected));
    assert!(!gate.can_start());
    assert_eq!(gate.state().chain_id, None);
}

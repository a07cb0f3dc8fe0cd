//! Progression gate: what the menu and wallet panel show, derived purely from
//! notifications. The game may only start while an account is connected.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::events::{ContextId, EventBus, Topic, WalletEvent};
use crate::plugin::WalletPlugin;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateState {
    pub account: Option<String>,
    pub chain_id: Option<u64>,
    pub chain_name: Option<String>,
    pub balance: Option<String>,
    pub block_number: Option<u64>,
    pub last_transaction: Option<String>,
    pub last_error: Option<String>,
}

pub struct GateStatus {
    bus: EventBus,
    context: ContextId,
    state: Rc<RefCell<GateState>>,
}

impl GateStatus {
    pub fn attach(plugin: &Rc<WalletPlugin>) -> Self {
        let bus = plugin.bus().clone();
        let context = bus.new_context();
        let state = Rc::new(RefCell::new(GateState::default()));
        for topic in Topic::all() {
            let state = state.clone();
            let plugin: Weak<WalletPlugin> = Rc::downgrade(plugin);
            bus.on(
                topic,
                move |event| {
                    let chain_name = match event {
                        WalletEvent::WalletConnected { .. } => plugin
                            .upgrade()
                            .and_then(|p| p.current_manager())
                            .map(|m| m.get_chain_info().name),
                        _ => None,
                    };
                    apply(&mut state.borrow_mut(), event, chain_name);
                    Ok(())
                },
                Some(context),
            );
        }
        Self { bus, context, state }
    }

    pub fn state(&self) -> GateState { self.state.borrow().clone() }

    /// Start button enabled.
    pub fn can_start(&self) -> bool { self.state.borrow().account.is_some() }

    pub fn short_account(&self) -> Option<String> {
        self.state.borrow().account.as_deref().map(short_account)
    }

    pub fn detach(self) -> usize { self.bus.off_context(self.context) }
}

fn apply(state: &mut GateState, event: &WalletEvent, chain_name: Option<String>) {
    match event {
        WalletEvent::WalletConnected { account, chain_id } => {
            state.account = Some(account.clone());
            state.chain_id = Some(*chain_id);
            state.chain_name = chain_name;
            state.last_error = None;
        }
        WalletEvent::WalletDisconnected => {
            *state = GateState { last_error: state.last_error.take(), ..GateState::default() };
        }
        WalletEvent::AccountChanged { account } => state.account = Some(account.clone()),
        WalletEvent::ChainChanged { chain_id } => state.chain_id = Some(*chain_id),
        WalletEvent::BalanceUpdated { balance } => state.balance = Some(balance.clone()),
        WalletEvent::BlockNumberUpdated { block_number } => state.block_number = Some(*block_number),
        WalletEvent::TransactionSent { hash } => state.last_transaction = Some(hash.clone()),
        WalletEvent::ProviderError { message, .. } | WalletEvent::PluginError { message } => {
            state.last_error = Some(message.clone())
        }
    }
}

/// `0x1234567890abcdef` -> `0x12345...bcdef`. Short inputs are returned whole.
pub fn short_account(account: &str) -> String {
    let chars: Vec<char> = account.chars().collect();
    if chars.len() <= 12 {
        return account.to_owned();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_like_the_account_panel() {
        assert_eq!(short_account("0x1234567890abcdef1234567890abcdef12345678"), "0x12345...45678");
        assert_eq!(short_account("0xabc"), "0xabc");
    }

    #[test]
    fn disconnect_keeps_the_last_error() {
        let mut state = GateState::default();
        apply(&mut state, &WalletEvent::WalletConnected { account: "0xa".into(), chain_id: 1030 }, None);
        apply(&mut state, &WalletEvent::BalanceUpdated { balance: "2".into() }, None);
        apply(&mut state, &WalletEvent::PluginError { message: "boom".into() }, None);
        apply(&mut state, &WalletEvent::WalletDisconnected, None);
        assert_eq!(state, GateState { last_error: Some("boom".into()), ..GateState::default() });
    }
}

//! EventBus - synchronous, in-order, fault-isolated delivery
//!
//! A handler's `Err` is isolated on every target. Panics are only caught where
//! unwinding exists: `wasm32-unknown-unknown` aborts on panic, so in the
//! browser build a panicking handler takes the module down with it.

use super::{Notifier, Topic, WalletEvent};
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

pub type Handler = Rc<dyn Fn(&WalletEvent) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Owner tag so a consumer can drop all of its subscriptions at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

struct Subscription {
    id: HandlerId,
    context: Option<ContextId>,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    subscriptions: HashMap<Topic, Vec<Subscription>>,
}

/// Shared handle; clones publish to and subscribe on the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Inner>>,
}

impl EventBus {
    pub fn new() -> Self { Self::default() }

    pub fn new_context(&self) -> ContextId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        ContextId(inner.next_id)
    }

    pub fn on<F>(&self, topic: Topic, handler: F, context: Option<ContextId>) -> HandlerId
    where
        F: Fn(&WalletEvent) -> anyhow::Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = HandlerId(inner.next_id);
        inner.subscriptions.entry(topic).or_default().push(Subscription { id, context, handler: Rc::new(handler) });
        id
    }

    /// Remove subscriptions on `topic` matching `handler` and/or `context`.
    /// With neither given, every subscription on the topic goes.
    pub fn off(&self, topic: Topic, handler: Option<HandlerId>, context: Option<ContextId>) -> usize {
        let mut inner = self.inner.borrow_mut();
        let Some(subs) = inner.subscriptions.get_mut(&topic) else { return 0 };
        let before = subs.len();
        subs.retain(|s| {
            let handler_matches = handler.map_or(true, |h| s.id == h);
            let context_matches = context.map_or(true, |c| s.context == Some(c));
            !(handler_matches && context_matches)
        });
        before - subs.len()
    }

    /// Remove every subscription registered under `context`, on all topics.
    pub fn off_context(&self, context: ContextId) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscriptions.values_mut().map(|subs| {
            let before = subs.len();
            subs.retain(|s| s.context != Some(context));
            before - subs.len()
        }).sum()
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner.borrow().subscriptions.get(&topic).map_or(0, Vec::len)
    }

    pub fn emit(&self, event: &WalletEvent) -> Delivery {
        let topic = event.topic();
        // Snapshot so handlers can (un)subscribe or emit while we deliver.
        let snapshot: Vec<(HandlerId, Handler)> = match self.inner.borrow().subscriptions.get(&topic) {
            Some(subs) => subs.iter().map(|s| (s.id, s.handler.clone())).collect(),
            None => return Delivery::default(),
        };

        let mut delivery = Delivery::default();
        for (id, handler) in snapshot {
            if !self.is_subscribed(topic, id) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    delivery.failed += 1;
                    tracing::warn!(topic = topic.name(), error = %e, "event handler failed");
                }
                Err(panic) => {
                    delivery.failed += 1;
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    tracing::warn!(topic = topic.name(), %reason, "event handler panicked");
                }
            }
        }
        delivery
    }

    fn is_subscribed(&self, topic: Topic, id: HandlerId) -> bool {
        self.inner.borrow().subscriptions.get(&topic).is_some_and(|subs| subs.iter().any(|s| s.id == id))
    }
}

impl Notifier for EventBus {
    fn notify(&self, event: WalletEvent) {
        tracing::debug!(topic = event.topic().name(), "emit");
        self.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn connected() -> WalletEvent {
        WalletEvent::WalletConnected { account: "0xabc".into(), chain_id: 1030 }
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let seen = seen.clone();
            bus.on(Topic::WalletConnected, move |_| { seen.borrow_mut().push(n); Ok(()) }, None);
        }
        let d = bus.emit(&connected());
        assert_eq!(d, Delivery { delivered: 3, failed: 0 });
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_topic_receives() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.on(Topic::WalletDisconnected, move |_| { h.set(h.get() + 1); Ok(()) }, None);
        bus.emit(&connected());
        assert_eq!(hits.get(), 0);
        bus.emit(&WalletEvent::WalletDisconnected);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn failing_handler_does_not_block_later_ones() {
        let bus = EventBus::new();
        let reached = Rc::new(Cell::new(false));
        bus.on(Topic::WalletConnected, |_| Err(anyhow::anyhow!("boom")), None);
        bus.on(Topic::WalletConnected, |_| panic!("handler bug"), None);
        let r = reached.clone();
        bus.on(Topic::WalletConnected, move |_| { r.set(true); Ok(()) }, None);

        let d = bus.emit(&connected());
        assert!(reached.get());
        assert_eq!(d, Delivery { delivered: 1, failed: 2 });
    }

    #[test]
    fn off_by_handler_context_and_topic() {
        let bus = EventBus::new();
        let ctx = bus.new_context();
        let a = bus.on(Topic::WalletConnected, |_| Ok(()), None);
        bus.on(Topic::WalletConnected, |_| Ok(()), Some(ctx));
        bus.on(Topic::WalletConnected, |_| Ok(()), Some(ctx));
        bus.on(Topic::WalletDisconnected, |_| Ok(()), Some(ctx));

        assert_eq!(bus.off(Topic::WalletConnected, Some(a), None), 1);
        assert_eq!(bus.off(Topic::WalletConnected, None, Some(ctx)), 2);
        assert_eq!(bus.listener_count(Topic::WalletConnected), 0);
        assert_eq!(bus.listener_count(Topic::WalletDisconnected), 1);

        bus.on(Topic::WalletDisconnected, |_| Ok(()), None);
        assert_eq!(bus.off(Topic::WalletDisconnected, None, None), 2);
    }

    #[test]
    fn off_context_spans_topics() {
        let bus = EventBus::new();
        let ctx = bus.new_context();
        let other = bus.new_context();
        bus.on(Topic::WalletConnected, |_| Ok(()), Some(ctx));
        bus.on(Topic::BalanceUpdated, |_| Ok(()), Some(ctx));
        bus.on(Topic::BalanceUpdated, |_| Ok(()), Some(other));
        assert_eq!(bus.off_context(ctx), 2);
        assert_eq!(bus.listener_count(Topic::BalanceUpdated), 1);
    }

    #[test]
    fn handler_may_unsubscribe_a_later_handler() {
        let bus = EventBus::new();
        let later_hit = Rc::new(Cell::new(false));
        let bus2 = bus.clone();
        let later_id = Rc::new(Cell::new(None));
        let id_slot = later_id.clone();
        bus.on(Topic::WalletConnected, move |_| {
            if let Some(id) = id_slot.get() { bus2.off(Topic::WalletConnected, Some(id), None); }
            Ok(())
        }, None);
        let hit = later_hit.clone();
        later_id.set(Some(bus.on(Topic::WalletConnected, move |_| { hit.set(true); Ok(()) }, None)));

        bus.emit(&connected());
        assert!(!later_hit.get());
    }

    #[test]
    fn events_before_subscription_are_lost() {
        let bus = EventBus::new();
        bus.emit(&connected());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.on(Topic::WalletConnected, move |_| { h.set(h.get() + 1); Ok(()) }, None);
        assert_eq!(hits.get(), 0);
    }
}

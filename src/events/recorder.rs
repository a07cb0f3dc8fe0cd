//! EventRecorder - fake bus for asserting exact emissions

use super::{EventBus, Notifier, Topic, WalletEvent};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<WalletEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self { Self::default() }

    /// Subscribe to every topic on `bus` and record what it delivers.
    pub fn attach(&self, bus: &EventBus) {
        for topic in Topic::all() {
            let events = self.events.clone();
            bus.on(topic, move |ev| { events.borrow_mut().push(ev.clone()); Ok(()) }, None);
        }
    }

    pub fn events(&self) -> Vec<WalletEvent> { self.events.borrow().clone() }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|e| e.topic().name()).collect()
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events.borrow().iter().filter(|e| e.topic() == topic).count()
    }

    pub fn last(&self) -> Option<WalletEvent> { self.events.borrow().last().cloned() }

    pub fn clear(&self) { self.events.borrow_mut().clear(); }
}

impl Notifier for EventRecorder {
    fn notify(&self, event: WalletEvent) {
        self.events.borrow_mut().push(event);
    }
}

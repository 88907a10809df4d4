//! Synchronous typed event bus.

use std::{collections::BTreeMap, fmt};

use tower_siege_core::Event;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the subscription.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

type Listener = Box<dyn FnMut(&Event)>;

/// Delivers every published event to each listener in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: BTreeMap<SubscriptionId, Listener>,
    next_id: u64,
}

impl EventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that receives every subsequent event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Delivers `event` to every listener.
    pub fn publish(&mut self, event: &Event) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Reports whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Core EventBus state
use super::stats::EventBusStats;
use crate::handler::HandlerId;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL_BUS: Lazy<Arc<EventBus>> = Lazy::new(|| Arc::new(EventBus::new()));

/// A registered handler with its message type erased.
#[derive(Clone)]
pub(super) struct Subscriber {
    pub(super) id: HandlerId,
    pub(super) name: Arc<str>,
    /// Holds a `Handler<T>` for the `TypeId` this entry is filed under.
    pub(super) handler: Arc<dyn Any + Send + Sync>,
}

/// Type-keyed publish/subscribe registry.
///
/// The bus never owns messages, only the mapping from message type to the
/// ordered list of subscribed handlers.
pub struct EventBus {
    pub(super) subscribers: RwLock<HashMap<TypeId, Vec<Subscriber>>>,
    pub(super) stats: Mutex<EventBusStats>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("message_types", &self.subscribers.read().len())
            .field("stats", &"[stats]")
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus. Most hosts use [`EventBus::global`] instead.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            stats: Mutex::new(EventBusStats::default()),
        }
    }

    /// The process-wide bus shared by every collaborator.
    pub fn global() -> Arc<EventBus> {
        GLOBAL_BUS.clone()
    }

    /// Snapshot of the bus counters.
    pub fn stats(&self) -> EventBusStats {
        let active = self.subscribers.read().values().map(Vec::len).sum();
        let mut stats = self.stats.lock().clone();
        stats.active_subscriptions = active;
        stats
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

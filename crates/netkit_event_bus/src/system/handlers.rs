/// Subscription management
use super::core::{EventBus, Subscriber};
use crate::handler::Handler;
use std::any::{type_name, TypeId};
use std::sync::Arc;
use tracing::debug;

impl EventBus {
    /// Registers `handler` for messages of type `T`.
    ///
    /// Returns `false` without changing anything if the same handler is already
    /// registered for `T`.
    pub fn subscribe<T: 'static>(&self, handler: &Handler<T>) -> bool {
        let id = handler.id();
        {
            let mut subscribers = self.subscribers.write();
            let list = subscribers.entry(TypeId::of::<T>()).or_default();
            if list.iter().any(|s| s.id == id) {
                debug!("Handler {} already subscribed to {}", handler.name(), type_name::<T>());
                return false;
            }

            list.push(Subscriber {
                id,
                name: handler.shared_name(),
                handler: Arc::new(handler.clone()),
            });
        }

        self.stats.lock().total_subscriptions += 1;
        debug!("📝 Subscribed {} to {}", handler.name(), type_name::<T>());
        true
    }

    /// Removes `handler` from messages of type `T`.
    ///
    /// Returns `false` if it was not registered. Safe to call from inside a
    /// handler, including the handler being removed.
    pub fn unsubscribe<T: 'static>(&self, handler: &Handler<T>) -> bool {
        let id = handler.id();
        let mut subscribers = self.subscribers.write();
        let type_id = TypeId::of::<T>();

        let Some(list) = subscribers.get_mut(&type_id) else {
            return false;
        };
        let Some(position) = list.iter().position(|s| s.id == id) else {
            return false;
        };

        list.remove(position);
        if list.is_empty() {
            subscribers.remove(&type_id);
        }

        debug!("🗑️ Unsubscribed {} from {}", handler.name(), type_name::<T>());
        true
    }

    /// Number of handlers currently registered for `T`.
    pub fn subscriber_count<T: 'static>(&self) -> usize {
        self.subscribers
            .read()
            .get(&TypeId::of::<T>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Returns true if `handler` is currently registered for `T`.
    pub fn is_subscribed<T: 'static>(&self, handler: &Handler<T>) -> bool {
        let id = handler.id();
        self.subscribers
            .read()
            .get(&TypeId::of::<T>())
            .is_some_and(|list| list.iter().any(|s| s.id == id))
    }
}

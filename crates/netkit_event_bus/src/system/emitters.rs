/// Message dispatch
use super::core::EventBus;
use super::stats::DispatchReport;
use crate::error::EventError;
use crate::handler::Handler;
use std::any::{type_name, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, trace};

impl EventBus {
    /// Delivers `message` to every handler registered for `T`.
    ///
    /// Dispatch runs over a copy of the subscriber list taken before the first
    /// handler is called, and no lock is held while handlers run. Handler errors
    /// and panics are logged and counted in the report, never propagated.
    pub fn publish<T: 'static>(&self, message: &T) -> DispatchReport {
        let snapshot = {
            let subscribers = self.subscribers.read();
            match subscribers.get(&TypeId::of::<T>()) {
                Some(list) => list.clone(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            trace!("No subscribers for {}", type_name::<T>());
            return DispatchReport::default();
        }

        let mut report = DispatchReport::default();
        for subscriber in &snapshot {
            let Some(handler) = subscriber.handler.downcast_ref::<Handler<T>>() else {
                continue;
            };

            report.invoked += 1;
            let result = match catch_unwind(AssertUnwindSafe(|| handler.call(message))) {
                Ok(result) => result,
                Err(payload) => Err(EventError::from_panic(payload)),
            };

            if let Err(e) = result {
                report.failed += 1;
                error!("❌ Handler {} failed for {}: {}", subscriber.name, type_name::<T>(), e);
            }
        }

        {
            let mut stats = self.stats.lock();
            stats.messages_published += 1;
            stats.handler_invocations += report.invoked as u64;
            stats.handler_failures += report.failed as u64;
        }

        trace!(
            "📤 Published {} to {} handlers ({} failed)",
            type_name::<T>(),
            report.invoked,
            report.failed
        );
        report
    }
}

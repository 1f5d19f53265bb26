/// Counters exposed for monitoring.
#[derive(Debug, Default, Clone)]
pub struct EventBusStats {
    /// Handlers registered right now, across all message types
    pub active_subscriptions: usize,
    /// Successful `subscribe` calls over the bus lifetime
    pub total_subscriptions: u64,
    /// Publishes that reached at least one handler
    pub messages_published: u64,
    pub handler_invocations: u64,
    pub handler_failures: u64,
}

/// Outcome of a single publish.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers called
    pub invoked: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

impl DispatchReport {
    /// Handlers that completed without error.
    pub fn delivered(&self) -> usize {
        self.invoked - self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.invoked == 0
    }
}

use std::any::Any;

/// Failure raised by a handler while processing a message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventError {
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}

impl EventError {
    /// Convenience constructor for handlers that want to reject a message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerExecution(message.into())
    }

    /// Converts a caught panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self::HandlerPanicked(message)
    }
}

//! Error taxonomy and the non-fatal reporting channel.

use std::fmt;
use std::sync::Arc;

/// Problems reported by factories, transports and providers.
///
/// Expected failures travel through an [`ErrorSink`]; only
/// `ServiceAlreadyRunning` and `InvalidConfig` are ever returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("{component}: {detail}")]
    MissingCapability { component: String, detail: String },
    #[error("{component} failed to initialize: {detail}")]
    BackendInitialization { component: String, detail: String },
    #[error("{component}: {detail}")]
    SessionOperation { component: String, detail: String },
    #[error("A network service is already running in this process")]
    ServiceAlreadyRunning,
    #[error("Invalid network configuration: {0}")]
    InvalidConfig(String),
}

impl NetworkError {
    pub fn missing(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MissingCapability {
            component: component.into(),
            detail: detail.into(),
        }
    }

    pub fn backend(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BackendInitialization {
            component: component.into(),
            detail: detail.into(),
        }
    }

    pub fn session(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SessionOperation {
            component: component.into(),
            detail: detail.into(),
        }
    }
}

/// Failures from a [`SessionManager`](crate::session::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A session is already active as {0}")]
    AlreadyActive(String),
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("No backend attached to the session manager")]
    NoBackend,
}

/// Failures from a [`RelayService`](crate::relay::RelayService).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Relay service is not initialized")]
    NotInitialized,
    #[error("Unknown join code '{0}'")]
    UnknownJoinCode(String),
    #[error("Unknown allocation {0}")]
    UnknownAllocation(String),
    #[error("Allocation {allocation} is full ({max} connections)")]
    AllocationFull { allocation: String, max: u32 },
    #[error("Invalid connection limit {0}")]
    InvalidConnectionLimit(u32),
}

/// Shared callback receiving every non-fatal problem.
///
/// Cloning is cheap; every transport and provider holds its own clone.
#[derive(Clone)]
pub struct ErrorSink {
    callback: Arc<dyn Fn(&NetworkError) + Send + Sync>,
}

impl ErrorSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&NetworkError) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Sink that logs with `error!`.
    pub fn logging() -> Self {
        Self::new(|err| tracing::error!("[netkit] {}", err))
    }

    /// Sink that drops everything.
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, error: NetworkError) {
        (self.callback)(&error);
    }

    /// Returns a sink that runs `self` and then `next`.
    pub fn chain(&self, next: ErrorSink) -> Self {
        let first = self.clone();
        Self::new(move |err| {
            (first.callback)(err);
            (next.callback)(err);
        })
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::logging()
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSink").finish_non_exhaustive()
    }
}

/// Collects reports in memory. Handy in tests and for hosts that show a dialog.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<parking_lot::Mutex<Vec<NetworkError>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> ErrorSink {
        let entries = self.entries.clone();
        ErrorSink::new(move |err| entries.lock().push(err.clone()))
    }

    pub fn entries(&self) -> Vec<NetworkError> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetworkError::missing("Session Relay (Managed)", "relay packages not installed");
        assert_eq!(err.to_string(), "Session Relay (Managed): relay packages not installed");

        let err = NetworkError::backend("Direct Socket (TCP)", "no session manager");
        assert!(err.to_string().contains("failed to initialize"));

        let err = RelayError::AllocationFull {
            allocation: "a1".to_string(),
            max: 2,
        };
        assert_eq!(err.to_string(), "Allocation a1 is full (2 connections)");
    }

    #[test]
    fn test_error_log_collects_reports() {
        let log = ErrorLog::new();
        let sink = log.sink();

        sink.report(NetworkError::session("Offline", "nothing to do"));
        sink.clone().report(NetworkError::InvalidConfig("bad".to_string()));

        assert_eq!(log.len(), 2);
        assert!(matches!(log.entries()[1], NetworkError::InvalidConfig(_)));

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_chain_runs_both() {
        let first = ErrorLog::new();
        let second = ErrorLog::new();
        let sink = first.sink().chain(second.sink());

        sink.report(NetworkError::ServiceAlreadyRunning);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}

use super::{report_session, Transport};
use crate::capability::{names, CapabilityRegistry};
use crate::config::NetworkConfig;
use crate::context::HostContext;
use crate::error::{ErrorSink, NetworkError};
use crate::session::{Endpoint, SessionManager};
use std::sync::Arc;
use tracing::{debug, info};

const NAME: &str = "Session Relay (External)";

/// Lobby-based sessions through a third-party relay adapter.
///
/// Rides on the host's direct-socket session manager: the adapter is attached
/// to it as a backend and clients join by lobby id.
pub struct SessionRelayExternalTransport {
    capabilities: CapabilityRegistry,
    adapter: Option<&'static str>,
    manager: Option<Arc<dyn SessionManager>>,
    errors: ErrorSink,
}

impl SessionRelayExternalTransport {
    pub fn new(capabilities: &CapabilityRegistry) -> Self {
        Self {
            capabilities: capabilities.clone(),
            adapter: None,
            manager: None,
            errors: ErrorSink::logging(),
        }
    }

    /// The adapter picked during `initialize`, if any.
    pub fn adapter(&self) -> Option<&'static str> {
        self.adapter
    }

    fn ready_manager(&self) -> Option<&Arc<dyn SessionManager>> {
        if !self.is_ready() {
            self.errors.report(NetworkError::session(
                NAME,
                "no relay adapter is attached to the session manager",
            ));
            return None;
        }
        self.manager.as_ref()
    }
}

impl Transport for SessionRelayExternalTransport {
    fn name(&self) -> &str {
        NAME
    }

    fn available(&self) -> bool {
        self.capabilities.probe(names::DIRECT_SOCKET)
            && self
                .capabilities
                .probe_any(&names::RELAY_EXTERNAL_CANDIDATES)
                .is_some()
    }

    fn initialize(&mut self, context: &mut HostContext, config: &NetworkConfig, errors: ErrorSink) {
        self.errors = errors;

        let Some(adapter) = self
            .capabilities
            .probe_any(&names::RELAY_EXTERNAL_CANDIDATES)
        else {
            self.errors.report(NetworkError::missing(
                NAME,
                format!(
                    "no relay adapter found (tried {})",
                    names::RELAY_EXTERNAL_CANDIDATES.join(", ")
                ),
            ));
            return;
        };

        let manager = context.find_or_create_session_manager();
        if !manager.has_backend(adapter) {
            if config.auto_attach_backend {
                manager.attach_backend(adapter);
                info!("🔌 Attached relay adapter {} to '{}'", adapter, manager.name());
            } else {
                self.errors.report(NetworkError::backend(
                    NAME,
                    format!("{adapter} is not attached and auto_attach_backend is off"),
                ));
            }
        }

        debug!("🔗 {} using adapter {}", NAME, adapter);
        self.adapter = Some(adapter);
        self.manager = Some(manager);
    }

    fn start_host(&mut self) {
        if let Some(manager) = self.ready_manager() {
            report_session(&self.errors, NAME, manager.start_host());
        }
    }

    fn start_client(&mut self, address_or_code: &str) {
        let lobby = address_or_code.trim();
        if lobby.is_empty() {
            self.errors
                .report(NetworkError::session(NAME, "a lobby id is required to join"));
            return;
        }

        if let Some(manager) = self.ready_manager() {
            let endpoint = Endpoint::Lobby(lobby.to_string());
            report_session(&self.errors, NAME, manager.start_client(&endpoint));
        }
    }

    fn start_server(&mut self) {
        if let Some(manager) = self.ready_manager() {
            report_session(&self.errors, NAME, manager.start_server());
        }
    }

    fn latency_ms(&self) -> u32 {
        self.manager
            .as_ref()
            .and_then(|manager| manager.rtt_ms())
            .unwrap_or(0)
    }

    fn is_ready(&self) -> bool {
        match (&self.manager, self.adapter) {
            (Some(manager), Some(adapter)) => manager.has_backend(adapter),
            _ => false,
        }
    }

    fn session_manager(&self) -> Option<Arc<dyn SessionManager>> {
        self.manager.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorLog;
    use crate::session::SessionRole;

    fn with_adapter(adapter: &str) -> CapabilityRegistry {
        CapabilityRegistry::empty()
            .with(names::DIRECT_SOCKET)
            .with(adapter)
    }

    #[test]
    fn test_missing_adapter_reports_once() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let caps = CapabilityRegistry::empty().with(names::DIRECT_SOCKET);
        let mut transport = SessionRelayExternalTransport::new(&caps);

        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());
        assert!(!transport.available());
        assert!(!transport.is_ready());
        assert_eq!(log.len(), 1);
        assert!(matches!(log.entries()[0], NetworkError::MissingCapability { .. }));

        transport.start_host();
        assert_eq!(log.len(), 2);
        assert!(matches!(log.entries()[1], NetworkError::SessionOperation { .. }));
    }

    #[test]
    fn test_picks_first_candidate_and_attaches() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let caps =
            with_adapter(names::RELAY_EXTERNAL_FACEPUNCH).with(names::RELAY_EXTERNAL_STEAMWORKS);
        let mut transport = SessionRelayExternalTransport::new(&caps);

        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());
        assert_eq!(transport.adapter(), Some(names::RELAY_EXTERNAL_STEAMWORKS));
        assert!(transport.is_ready());

        transport.start_host();
        assert!(log.is_empty());
        assert_eq!(context.session_manager().unwrap().role(), SessionRole::Host);
    }

    #[test]
    fn test_no_auto_attach_leaves_not_ready() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let config = NetworkConfig {
            auto_attach_backend: false,
            ..NetworkConfig::default()
        };
        let caps = with_adapter(names::RELAY_EXTERNAL_STEAM_SOCKETS);
        let mut transport = SessionRelayExternalTransport::new(&caps);

        transport.initialize(&mut context, &config, log.sink());
        assert!(!transport.is_ready());
        assert!(matches!(log.entries()[0], NetworkError::BackendInitialization { .. }));

        transport.start_client("lobby-42");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_client_joins_lobby() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let caps = with_adapter(names::RELAY_EXTERNAL_STEAM_SOCKETS);
        let mut transport = SessionRelayExternalTransport::new(&caps);
        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());

        transport.start_client("   ");
        assert_eq!(log.len(), 1);

        transport.start_client("76561198000000000");
        assert_eq!(log.len(), 1);
        let manager = context.session_manager().unwrap();
        assert_eq!(manager.endpoint(), Some(Endpoint::Lobby("76561198000000000".to_string())));
    }
}

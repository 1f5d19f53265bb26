use super::{report_session, Transport};
use crate::capability::{names, CapabilityRegistry};
use crate::config::NetworkConfig;
use crate::context::HostContext;
use crate::error::{ErrorSink, NetworkError};
use crate::session::{Endpoint, SessionManager};
use std::sync::Arc;
use tracing::debug;

/// Which direct-socket backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectSocketFlavor {
    /// Use whatever backend the host's session manager already has, or TCP.
    Auto,
    Primary,
    Alternate,
}

impl DirectSocketFlavor {
    pub fn transport_name(&self) -> &'static str {
        match self {
            DirectSocketFlavor::Auto => "Direct Socket (Auto)",
            DirectSocketFlavor::Primary => "Direct Socket (TCP)",
            DirectSocketFlavor::Alternate => "Direct Socket (KCP)",
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            DirectSocketFlavor::Auto | DirectSocketFlavor::Primary => "tcp",
            DirectSocketFlavor::Alternate => "kcp",
        }
    }
}

/// Address-based sessions through the host's session manager.
pub struct DirectSocketTransport {
    flavor: DirectSocketFlavor,
    available: bool,
    manager: Option<Arc<dyn SessionManager>>,
    errors: ErrorSink,
}

impl DirectSocketTransport {
    pub fn new(flavor: DirectSocketFlavor, capabilities: &CapabilityRegistry) -> Self {
        Self {
            flavor,
            available: capabilities.probe(names::DIRECT_SOCKET),
            manager: None,
            errors: ErrorSink::logging(),
        }
    }

    pub fn flavor(&self) -> DirectSocketFlavor {
        self.flavor
    }

    fn ready_manager(&self) -> Option<&Arc<dyn SessionManager>> {
        let manager = self.manager.as_ref();
        if manager.is_none() {
            self.errors.report(NetworkError::session(
                self.name(),
                "transport is not initialized",
            ));
        }
        manager
    }
}

impl Transport for DirectSocketTransport {
    fn name(&self) -> &str {
        self.flavor.transport_name()
    }

    fn available(&self) -> bool {
        self.available
    }

    fn initialize(
        &mut self,
        context: &mut HostContext,
        _config: &NetworkConfig,
        errors: ErrorSink,
    ) {
        self.errors = errors;

        if !self.available {
            self.errors.report(NetworkError::missing(
                self.name(),
                format!("{} is not compiled into this build", names::DIRECT_SOCKET),
            ));
            return;
        }

        let manager = context.find_or_create_session_manager();
        let backend = self.flavor.backend();

        // Auto keeps whatever the host already attached
        let wants_backend = match self.flavor {
            DirectSocketFlavor::Auto => manager.backends().is_empty(),
            DirectSocketFlavor::Primary | DirectSocketFlavor::Alternate => true,
        };
        if wants_backend && !manager.has_backend(backend) {
            manager.attach_backend(backend);
        }

        debug!(
            "🔗 {} bound to session manager '{}'",
            self.name(),
            manager.name()
        );
        self.manager = Some(manager);
    }

    fn start_host(&mut self) {
        if let Some(manager) = self.ready_manager() {
            report_session(&self.errors, self.name(), manager.start_host());
        }
    }

    fn start_client(&mut self, address_or_code: &str) {
        let Some(manager) = self.ready_manager() else {
            return;
        };

        match Endpoint::parse_address(address_or_code) {
            Ok(endpoint) => {
                report_session(&self.errors, self.name(), manager.start_client(&endpoint))
            }
            Err(err) => self
                .errors
                .report(NetworkError::session(self.name(), err.to_string())),
        }
    }

    fn start_server(&mut self) {
        if let Some(manager) = self.ready_manager() {
            report_session(&self.errors, self.name(), manager.start_server());
        }
    }

    fn latency_ms(&self) -> u32 {
        self.manager
            .as_ref()
            .and_then(|manager| manager.rtt_ms())
            .unwrap_or(0)
    }

    fn is_ready(&self) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|manager| !manager.backends().is_empty())
    }

    fn session_manager(&self) -> Option<Arc<dyn SessionManager>> {
        self.manager.clone()
    }
}

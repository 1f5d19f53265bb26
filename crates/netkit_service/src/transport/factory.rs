use super::{
    DirectSocketFlavor, DirectSocketTransport, OfflineTransport, SessionRelayExternalTransport,
    SessionRelayManagedTransport, Transport,
};
use crate::capability::{names, CapabilityRegistry};
use crate::config::{NetworkConfig, TransportKind};
use crate::error::{ErrorSink, NetworkError};
use tracing::info;

const COMPONENT: &str = "TransportFactory";

/// Picks the concrete transport for a configuration.
///
/// Always returns a transport. When the requested backend is missing the
/// factory reports exactly once through `errors` and falls back to
/// [`OfflineTransport`].
pub struct TransportFactory;

impl TransportFactory {
    pub fn create(
        config: &NetworkConfig,
        capabilities: &CapabilityRegistry,
        errors: &ErrorSink,
    ) -> Box<dyn Transport> {
        let kind = config.transport_kind;

        // The managed relay does not depend on the direct-socket subsystem.
        if kind == TransportKind::SessionRelayManaged {
            if !capabilities.probe_all(&names::RELAY_MANAGED_REQUIRED) {
                return Self::fallback(
                    errors,
                    format!(
                        "{} requested but relay packages are missing ({}), running Offline",
                        TransportKind::SessionRelayManaged,
                        names::RELAY_MANAGED_REQUIRED.join(", ")
                    ),
                );
            }
            return Self::chosen(Box::new(SessionRelayManagedTransport::new(capabilities)));
        }

        if !capabilities.probe(names::DIRECT_SOCKET) {
            return Self::fallback(
                errors,
                format!(
                    "no direct-socket backend in this build, {kind} unavailable, running Offline"
                ),
            );
        }

        let transport: Box<dyn Transport> = match kind {
            TransportKind::Auto => {
                Box::new(DirectSocketTransport::new(DirectSocketFlavor::Auto, capabilities))
            }
            TransportKind::DirectSocketPrimary => {
                Box::new(DirectSocketTransport::new(DirectSocketFlavor::Primary, capabilities))
            }
            TransportKind::DirectSocketAlternate => {
                Box::new(DirectSocketTransport::new(DirectSocketFlavor::Alternate, capabilities))
            }
            TransportKind::SessionRelayExternal => {
                if capabilities
                    .probe_any(&names::RELAY_EXTERNAL_CANDIDATES)
                    .is_none()
                {
                    return Self::fallback(
                        errors,
                        format!(
                            "{} requested but no relay adapter is present ({}), running Offline",
                            kind,
                            names::RELAY_EXTERNAL_CANDIDATES.join(", ")
                        ),
                    );
                }
                Box::new(SessionRelayExternalTransport::new(capabilities))
            }
            TransportKind::SessionRelayManaged => {
                Box::new(SessionRelayManagedTransport::new(capabilities))
            }
        };

        Self::chosen(transport)
    }

    fn chosen(transport: Box<dyn Transport>) -> Box<dyn Transport> {
        info!("🚚 Selected transport: {}", transport.name());
        transport
    }

    fn fallback(errors: &ErrorSink, detail: String) -> Box<dyn Transport> {
        errors.report(NetworkError::missing(COMPONENT, detail));
        Self::chosen(Box::new(OfflineTransport::new()))
    }
}

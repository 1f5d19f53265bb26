//! Transport contract and its variants.
//!
//! A transport wraps one session mechanism (loopback, direct socket, relay)
//! behind the same synchronous lifecycle. Nothing here returns errors for
//! expected failures: problems go to the [`ErrorSink`] handed over in
//! [`Transport::initialize`] and the transport stays usable.

mod direct_socket;
mod factory;
mod offline;
mod relay_external;
mod relay_managed;

pub use direct_socket::{DirectSocketFlavor, DirectSocketTransport};
pub use factory::TransportFactory;
pub use offline::OfflineTransport;
pub use relay_external::SessionRelayExternalTransport;
pub use relay_managed::SessionRelayManagedTransport;

use crate::config::NetworkConfig;
use crate::context::HostContext;
use crate::error::{ErrorSink, NetworkError, SessionError};
use crate::session::SessionManager;
use std::sync::Arc;

/// A pluggable session backend.
pub trait Transport: Send {
    /// Human-readable name, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether the backend this transport drives is present in the build.
    fn available(&self) -> bool;

    /// Locates or creates backend session objects in the host context.
    ///
    /// Idempotent. Unmet prerequisites are reported through `errors`; the
    /// transport is still constructed and merely not ready.
    fn initialize(&mut self, context: &mut HostContext, config: &NetworkConfig, errors: ErrorSink);

    fn start_host(&mut self);

    /// `address_or_code` is `host[:port]` for direct sockets, a join code or
    /// lobby id for relays.
    fn start_client(&mut self, address_or_code: &str);

    fn start_server(&mut self);

    /// Best-effort round-trip estimate; 0 when unknown.
    fn latency_ms(&self) -> u32;

    /// Whether a session can be started right now.
    fn is_ready(&self) -> bool;

    /// Advances pending backend work. Called once per tick.
    fn poll(&mut self) {}

    /// Join code of the hosted relay session, once one has been issued.
    fn join_code(&self) -> Option<String> {
        None
    }

    fn is_offline(&self) -> bool {
        false
    }

    /// The session manager this transport drives, if any.
    fn session_manager(&self) -> Option<Arc<dyn SessionManager>> {
        None
    }
}

/// Forwards a failed session start to the sink.
pub(crate) fn report_session(
    errors: &ErrorSink,
    component: &str,
    result: Result<(), SessionError>,
) {
    if let Err(err) = result {
        errors.report(NetworkError::session(component, err.to_string()));
    }
}

use super::{report_session, Transport};
use crate::capability::{names, CapabilityRegistry};
use crate::config::NetworkConfig;
use crate::context::HostContext;
use crate::error::{ErrorSink, NetworkError, RelayError};
use crate::relay::{Allocation, JoinedAllocation, LocalRelayService, RelayService};
use crate::session::{Endpoint, SessionManager};
use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info};

const NAME: &str = "Session Relay (Managed)";
const INACTIVE_NAME: &str = "Session Relay (inactive)";
const RELAY_BACKEND: &str = "relay";

type HostResult = Result<(Allocation, String), RelayError>;

/// Relay work started by `start_host`/`start_client`, finished in `poll`.
enum PendingOp {
    Idle,
    Allocating(BoxFuture<'static, HostResult>),
    Joining {
        code: String,
        future: BoxFuture<'static, Result<JoinedAllocation, RelayError>>,
    },
}

enum Completed {
    Hosted(HostResult),
    Joined(String, Result<JoinedAllocation, RelayError>),
}

/// Join-code sessions through a managed relay service.
///
/// When the relay packages are not linked this is an inactive stub: it reports
/// what is missing on `initialize` and ignores every start call.
pub struct SessionRelayManagedTransport {
    available: bool,
    max_connections: u32,
    configured_code: String,
    relay: Option<Arc<dyn RelayService>>,
    manager: Option<Arc<dyn SessionManager>>,
    pending: PendingOp,
    join_code: Option<String>,
    /// Allocation this transport hosts, released before the next one is made
    hosted_allocation: Option<String>,
    errors: ErrorSink,
}

impl SessionRelayManagedTransport {
    pub fn new(capabilities: &CapabilityRegistry) -> Self {
        Self {
            available: capabilities.probe_all(&names::RELAY_MANAGED_REQUIRED),
            max_connections: NetworkConfig::default().max_relay_connections,
            configured_code: String::new(),
            relay: None,
            manager: None,
            pending: PendingOp::Idle,
            join_code: None,
            hosted_allocation: None,
            errors: ErrorSink::logging(),
        }
    }

    /// True while an allocation or join is in flight.
    pub fn is_busy(&self) -> bool {
        !matches!(self.pending, PendingOp::Idle)
    }

    fn begin(&mut self) -> Option<Arc<dyn RelayService>> {
        if !self.available {
            debug!("{} ignoring start request", INACTIVE_NAME);
            return None;
        }
        if !self.is_ready() {
            self.errors
                .report(NetworkError::session(NAME, "relay transport is not ready"));
            return None;
        }
        if self.is_busy() {
            self.errors.report(NetworkError::session(
                NAME,
                "a relay operation is already in progress",
            ));
            return None;
        }
        self.relay.clone()
    }

    fn finish(&mut self, completed: Completed) {
        let Some(manager) = self.manager.clone() else {
            return;
        };

        match completed {
            Completed::Hosted(Ok((allocation, code))) => {
                info!("🔑 Relay session ready, join code {}", code);
                self.join_code = Some(code.clone());
                self.hosted_allocation = Some(allocation.id.clone());
                manager.attach_backend(RELAY_BACKEND);
                manager.bind(Endpoint::Relay {
                    allocation_id: allocation.id,
                    join_code: code,
                });
                report_session(&self.errors, NAME, manager.start_host());
            }
            Completed::Hosted(Err(err)) => {
                self.errors.report(NetworkError::session(
                    NAME,
                    format!("relay allocation failed: {err}"),
                ));
            }
            Completed::Joined(_, Ok(joined)) => {
                info!(
                    "🤝 Joined relay allocation {} as peer {}",
                    joined.allocation_id, joined.connection_index
                );
                manager.attach_backend(RELAY_BACKEND);
                let endpoint = Endpoint::Relay {
                    allocation_id: joined.allocation_id,
                    join_code: joined.join_code,
                };
                report_session(&self.errors, NAME, manager.start_client(&endpoint));
            }
            Completed::Joined(code, Err(err)) => {
                self.errors.report(NetworkError::session(
                    NAME,
                    format!("failed to join relay with code {code}: {err}"),
                ));
            }
        }
    }
}

impl Transport for SessionRelayManagedTransport {
    fn name(&self) -> &str {
        if self.available {
            NAME
        } else {
            INACTIVE_NAME
        }
    }

    fn available(&self) -> bool {
        self.available
    }

    fn initialize(&mut self, context: &mut HostContext, config: &NetworkConfig, errors: ErrorSink) {
        self.errors = errors;

        if !self.available {
            self.errors.report(NetworkError::missing(
                INACTIVE_NAME,
                format!(
                    "relay packages not installed ({})",
                    names::RELAY_MANAGED_REQUIRED.join(", ")
                ),
            ));
            return;
        }

        self.max_connections = config.max_relay_connections;
        self.configured_code = config.join_code.trim().to_string();

        let relay = match context.relay_service() {
            Some(relay) => relay,
            None => {
                debug!("🧩 No relay service in host context, installing a local one");
                let relay: Arc<dyn RelayService> = Arc::new(LocalRelayService::new());
                context.set_relay_service(relay.clone());
                relay
            }
        };
        self.relay = Some(relay);

        match context.session_manager() {
            Some(manager) => self.manager = Some(manager),
            None => self.errors.report(NetworkError::backend(
                NAME,
                "no session manager found in the host context",
            )),
        }
    }

    fn start_host(&mut self) {
        let Some(relay) = self.begin() else {
            return;
        };

        let max_connections = self.max_connections;
        info!("📡 Requesting relay allocation for {} connections", max_connections);
        self.join_code = None;
        let previous = self.hosted_allocation.take();
        self.pending = PendingOp::Allocating(Box::pin(async move {
            relay.ensure_initialized().await?;
            if let Some(previous) = previous {
                if let Err(err) = relay.release_allocation(&previous).await {
                    debug!("Previous relay allocation {} not released: {}", previous, err);
                }
            }
            let allocation = relay.create_allocation(max_connections).await?;
            let code = relay.join_code(&allocation.id).await?;
            Ok::<_, RelayError>((allocation, code))
        }));
    }

    fn start_client(&mut self, address_or_code: &str) {
        let mut code = address_or_code.trim().to_string();
        if code.is_empty() {
            // Fall back to the code shipped in the configuration
            code = self.configured_code.clone();
        }
        if self.available && code.is_empty() {
            self.errors
                .report(NetworkError::session(NAME, "a join code is required"));
            return;
        }
        let Some(relay) = self.begin() else {
            return;
        };

        info!("📡 Joining relay with code {}", code);
        let join = code.clone();
        self.pending = PendingOp::Joining {
            code,
            future: Box::pin(async move {
                relay.ensure_initialized().await?;
                relay.join_allocation(&join).await
            }),
        };
    }

    fn start_server(&mut self) {
        if !self.available {
            debug!("{} ignoring start request", INACTIVE_NAME);
            return;
        }
        self.errors.report(NetworkError::session(
            NAME,
            "dedicated servers need a direct-socket transport",
        ));
    }

    fn latency_ms(&self) -> u32 {
        0
    }

    fn is_ready(&self) -> bool {
        self.available && self.relay.is_some() && self.manager.is_some()
    }

    fn poll(&mut self) {
        let mut cx = Context::from_waker(noop_waker_ref());

        let completed = match &mut self.pending {
            PendingOp::Idle => return,
            PendingOp::Allocating(future) => match future.as_mut().poll(&mut cx) {
                Poll::Ready(result) => Completed::Hosted(result),
                Poll::Pending => return,
            },
            PendingOp::Joining { code, future } => match future.as_mut().poll(&mut cx) {
                Poll::Ready(result) => Completed::Joined(code.clone(), result),
                Poll::Pending => return,
            },
        };

        self.pending = PendingOp::Idle;
        self.finish(completed);
    }

    fn join_code(&self) -> Option<String> {
        self.join_code.clone()
    }

    fn session_manager(&self) -> Option<Arc<dyn SessionManager>> {
        self.manager.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorLog;
    use crate::session::{LocalSessionManager, SessionRole};

    fn managed_capabilities() -> CapabilityRegistry {
        CapabilityRegistry::empty()
            .with(names::RELAY_MANAGED_TRANSPORT)
            .with(names::RELAY_MANAGED_SERVICE)
    }

    fn context_with_relay(latency_polls: u32) -> (HostContext, Arc<LocalSessionManager>) {
        let manager = Arc::new(LocalSessionManager::new());
        let context = HostContext::new()
            .with_session_manager(manager.clone())
            .with_relay_service(Arc::new(LocalRelayService::with_latency_polls(latency_polls)));
        (context, manager)
    }

    fn ready_transport(context: &mut HostContext) -> (SessionRelayManagedTransport, ErrorLog) {
        let log = ErrorLog::new();
        let mut transport = SessionRelayManagedTransport::new(&managed_capabilities());
        transport.initialize(context, &NetworkConfig::default(), log.sink());
        (transport, log)
    }

    fn poll_until_idle(transport: &mut SessionRelayManagedTransport) -> usize {
        let mut polls = 0;
        while transport.is_busy() {
            transport.poll();
            polls += 1;
            assert!(polls < 100, "relay operation never completed");
        }
        polls
    }

    #[test]
    fn test_inactive_stub() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let half = CapabilityRegistry::empty().with(names::RELAY_MANAGED_TRANSPORT);
        let mut transport = SessionRelayManagedTransport::new(&half);

        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());
        assert_eq!(transport.name(), "Session Relay (inactive)");
        assert!(!transport.available());
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].to_string().contains("relay.managed.service"));

        transport.start_host();
        transport.start_client("ABC123");
        transport.start_server();
        transport.poll();
        assert_eq!(log.len(), 1);
        assert!(!transport.is_busy());
        assert!(context.relay_service().is_none());
    }

    #[test]
    fn test_missing_session_manager_reports_but_stays_usable() {
        let log = ErrorLog::new();
        let mut context = HostContext::new();
        let mut transport = SessionRelayManagedTransport::new(&managed_capabilities());

        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());
        assert!(matches!(log.entries()[0], NetworkError::BackendInitialization { .. }));
        assert!(context.relay_service().is_some());
        assert!(!transport.is_ready());

        transport.start_host();
        assert_eq!(log.len(), 2);
        assert!(!transport.is_busy());
    }

    #[test]
    fn test_host_completes_on_later_poll() {
        let (mut context, manager) = context_with_relay(2);
        let (mut transport, log) = ready_transport(&mut context);

        transport.start_host();
        assert!(transport.is_busy());
        assert_eq!(transport.join_code(), None);
        assert_eq!(manager.role(), SessionRole::Idle);

        let polls = poll_until_idle(&mut transport);
        assert!(polls > 1);

        let code = transport.join_code().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(manager.role(), SessionRole::Host);
        assert!(manager.has_backend("relay"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_client_joins_hosted_code() {
        let (mut host_context, _) = context_with_relay(0);
        let relay = host_context.relay_service().unwrap();
        let (mut host, _) = ready_transport(&mut host_context);
        host.start_host();
        poll_until_idle(&mut host);
        let code = host.join_code().unwrap();

        let client_manager = Arc::new(LocalSessionManager::new());
        let mut client_context = HostContext::new()
            .with_session_manager(client_manager.clone())
            .with_relay_service(relay);
        let (mut client, log) = ready_transport(&mut client_context);

        client.start_client(&code.to_lowercase());
        poll_until_idle(&mut client);

        assert!(log.is_empty());
        assert_eq!(client_manager.role(), SessionRole::Client);
        assert_eq!(client.join_code(), None);
    }

    #[test]
    fn test_unknown_code_reports_session_failure() {
        let (mut context, manager) = context_with_relay(0);
        let (mut transport, log) = ready_transport(&mut context);

        transport.start_client("ZZZZZZ");
        poll_until_idle(&mut transport);

        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].to_string().contains("ZZZZZZ"));
        assert_eq!(manager.role(), SessionRole::Idle);

        transport.start_client("");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_empty_client_argument_uses_configured_code() {
        let (mut host_context, _) = context_with_relay(0);
        let relay = host_context.relay_service().unwrap();
        let (mut host, _) = ready_transport(&mut host_context);
        host.start_host();
        poll_until_idle(&mut host);

        let config = NetworkConfig {
            join_code: host.join_code().unwrap(),
            ..NetworkConfig::default()
        };
        let client_manager = Arc::new(LocalSessionManager::new());
        let mut client_context = HostContext::new()
            .with_session_manager(client_manager.clone())
            .with_relay_service(relay);
        let log = ErrorLog::new();
        let mut client = SessionRelayManagedTransport::new(&managed_capabilities());
        client.initialize(&mut client_context, &config, log.sink());

        client.start_client("  ");
        poll_until_idle(&mut client);

        assert!(log.is_empty());
        assert_eq!(client_manager.role(), SessionRole::Client);
    }

    #[test]
    fn test_rehosting_releases_previous_allocation() {
        let relay = Arc::new(LocalRelayService::new());
        let manager = Arc::new(LocalSessionManager::new());
        let mut context = HostContext::new()
            .with_session_manager(manager.clone())
            .with_relay_service(relay.clone());
        let (mut transport, log) = ready_transport(&mut context);

        transport.start_host();
        poll_until_idle(&mut transport);
        let first = transport.join_code().unwrap();

        manager.stop();
        transport.start_host();
        poll_until_idle(&mut transport);
        let second = transport.join_code().unwrap();

        assert!(log.is_empty());
        assert_ne!(first, second);
        assert_eq!(relay.allocation_count(), 1);
        assert_eq!(relay.connections(&first), None);
        assert_eq!(relay.connections(&second), Some(0));
    }

    #[test]
    fn test_busy_rejects_second_start() {
        let (mut context, _) = context_with_relay(3);
        let (mut transport, log) = ready_transport(&mut context);

        transport.start_host();
        transport.start_host();
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].to_string().contains("already in progress"));
    }

    #[test]
    fn test_server_is_rejected() {
        let (mut context, _) = context_with_relay(0);
        let (mut transport, log) = ready_transport(&mut context);

        transport.start_server();
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].to_string().contains("direct-socket"));
        assert_eq!(transport.latency_ms(), 0);
    }

    #[test]
    fn test_initialize_twice_is_idempotent() {
        let (mut context, _) = context_with_relay(0);
        let (mut transport, log) = ready_transport(&mut context);
        let relay = context.relay_service().unwrap();

        transport.initialize(&mut context, &NetworkConfig::default(), log.sink());
        assert!(transport.is_ready());
        assert!(Arc::ptr_eq(&relay, &context.relay_service().unwrap()));
        assert!(log.is_empty());
    }
}

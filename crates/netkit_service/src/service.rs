//! The network service orchestrator.
//!
//! One [`NetworkService`] exists per process. It is built by the host
//! application's entry point, owns the selected transport and anti-cheat
//! provider for its whole lifetime, and is passed to whoever needs to start a
//! session. Dropping it releases the slot so a new one can be built.

use crate::anticheat::{AntiCheatFactory, AntiCheatProvider, Violation};
use crate::capability::CapabilityRegistry;
use crate::config::{KeyCode, NetworkConfig};
use crate::context::HostContext;
use crate::diagnostics::{DiagnosticsOverlay, DiagnosticsSink, TransportStatus};
use crate::error::{ErrorSink, NetworkError};
use crate::transport::{Transport, TransportFactory};
use netkit_event_bus::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

static SERVICE_RUNNING: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Bus messages
// ============================================================================

/// Published once a hosted relay session has a join code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCodeIssued {
    pub code: String,
}

/// Published for every problem reported through the error sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkNotice {
    pub message: String,
}

// ============================================================================
// Input
// ============================================================================

/// Per-tick keyboard poll supplied by the host application.
pub trait InputPoll {
    /// True if `key` went down since the previous tick.
    fn key_pressed(&self, key: KeyCode) -> bool;
}

/// Input source that never reports a key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputPoll for NoInput {
    fn key_pressed(&self, _key: KeyCode) -> bool {
        false
    }
}

impl<F> InputPoll for F
where
    F: Fn(KeyCode) -> bool,
{
    fn key_pressed(&self, key: KeyCode) -> bool {
        self(key)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects the collaborators for [`NetworkService`].
///
/// Everything but the configuration is optional: capabilities default to the
/// build's features, the context starts empty, the event bus is the global one,
/// errors are logged, and diagnostics use a [`DiagnosticsOverlay`].
pub struct NetworkServiceBuilder {
    config: NetworkConfig,
    capabilities: Option<CapabilityRegistry>,
    context: Option<HostContext>,
    event_bus: Option<Arc<EventBus>>,
    error_sink: Option<ErrorSink>,
    diagnostics: Option<Box<dyn DiagnosticsSink>>,
}

impl NetworkServiceBuilder {
    pub fn capabilities(mut self, capabilities: CapabilityRegistry) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn context(mut self, context: HostContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn error_sink(mut self, error_sink: ErrorSink) -> Self {
        self.error_sink = Some(error_sink);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Box<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Builds and initializes the service.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation,
    /// `ServiceAlreadyRunning` if another service is alive in this process.
    pub fn build(self) -> Result<NetworkService, NetworkError> {
        self.config.validate().map_err(NetworkError::InvalidConfig)?;
        let guard = InstanceGuard::acquire()?;

        let config = self.config;
        let capabilities = self.capabilities.unwrap_or_else(CapabilityRegistry::detect);
        let mut context = self.context.unwrap_or_default();
        let event_bus = self.event_bus.unwrap_or_else(EventBus::global);

        let notice_bus = event_bus.clone();
        let errors = self
            .error_sink
            .unwrap_or_else(ErrorSink::logging)
            .chain(ErrorSink::new(move |err| {
                notice_bus.publish(&NetworkNotice {
                    message: err.to_string(),
                });
            }));

        let mut diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Box::new(DiagnosticsOverlay::new()) as Box<dyn DiagnosticsSink>);
        diagnostics.set_overlay_visible(config.show_diagnostics_overlay);

        let mut transport = TransportFactory::create(&config, &capabilities, &errors);
        transport.initialize(&mut context, &config, errors.clone());

        let mut anti_cheat =
            AntiCheatFactory::create_or_fallback(config.anti_cheat_kind, &capabilities, &errors);
        if let Some(provider) = anti_cheat.as_mut() {
            provider.initialize(errors.clone());

            let violation_bus = event_bus.clone();
            let source = provider.name().to_string();
            provider.on_violation(Arc::new(move |violation: &Violation| {
                if violation.is_informational() {
                    info!("🛡️ [{}] {}", source, violation.message);
                } else {
                    warn!(
                        "🛡️ [{}] {} (confidence {})",
                        source, violation.message, violation.confidence
                    );
                }
                violation_bus.publish(violation);
            }));

            if provider.available() {
                provider.enable();
            }
        }

        let mut service = NetworkService {
            config,
            capabilities,
            context,
            transport,
            anti_cheat,
            diagnostics,
            event_bus,
            errors,
            announced_join_code: None,
            _guard: guard,
        };
        service.refresh_diagnostics();

        info!(
            "✅ Network service ready: transport={}, anti-cheat={}",
            service.transport.name(),
            service
                .anti_cheat
                .as_ref()
                .map(|provider| provider.name())
                .unwrap_or("none")
        );
        Ok(service)
    }
}

/// Holds the per-process slot; releasing it on drop.
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self, NetworkError> {
        if SERVICE_RUNNING
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("❌ Rejected a second network service, one is already running");
            return Err(NetworkError::ServiceAlreadyRunning);
        }
        Ok(Self)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        SERVICE_RUNNING.store(false, Ordering::Release);
        debug!("🗑️ Network service slot released");
    }
}

// ============================================================================
// Service
// ============================================================================

/// Owns the transport, the anti-cheat provider and the diagnostics sink.
pub struct NetworkService {
    config: NetworkConfig,
    capabilities: CapabilityRegistry,
    context: HostContext,
    transport: Box<dyn Transport>,
    anti_cheat: Option<Box<dyn AntiCheatProvider>>,
    diagnostics: Box<dyn DiagnosticsSink>,
    event_bus: Arc<EventBus>,
    errors: ErrorSink,
    announced_join_code: Option<String>,
    _guard: InstanceGuard,
}

impl NetworkService {
    pub fn builder(config: NetworkConfig) -> NetworkServiceBuilder {
        NetworkServiceBuilder {
            config,
            capabilities: None,
            context: None,
            event_bus: None,
            error_sink: None,
            diagnostics: None,
        }
    }

    /// True while a service is alive in this process.
    pub fn is_running() -> bool {
        SERVICE_RUNNING.load(Ordering::Acquire)
    }

    pub fn start_host(&mut self) {
        info!("🚀 Starting host via {}", self.transport.name());
        self.transport.start_host();
    }

    pub fn start_client(&mut self, address_or_code: &str) {
        info!("🚀 Starting client via {} ({})", self.transport.name(), address_or_code);
        self.transport.start_client(address_or_code);
    }

    pub fn start_server(&mut self) {
        info!("🚀 Starting server via {}", self.transport.name());
        self.transport.start_server();
    }

    /// Flips diagnostics overlay visibility.
    pub fn toggle_diagnostics(&mut self) {
        self.diagnostics.toggle();
        debug!("Diagnostics overlay visible: {}", self.diagnostics.is_visible());
    }

    /// Per-frame work: toggle input, transport progress, join code, diagnostics.
    pub fn tick(&mut self, input: &dyn InputPoll, frame_time: Duration) {
        if input.key_pressed(self.config.toggle_key) {
            self.toggle_diagnostics();
        }

        self.transport.poll();

        let code = self.transport.join_code();
        if code.is_some() && code != self.announced_join_code {
            if let Some(code) = &code {
                info!("🔑 Join code issued: {}", code);
                self.event_bus.publish(&JoinCodeIssued { code: code.clone() });
            }
            self.announced_join_code = code;
        }

        self.refresh_diagnostics();
        self.diagnostics.update(frame_time);
    }

    /// True when playing offline or when this process owns the session.
    pub fn is_server_or_offline(&self) -> bool {
        self.transport.is_offline()
            || self
                .transport
                .session_manager()
                .map(|manager| manager.role().is_authority())
                .unwrap_or(false)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn anti_cheat(&self) -> Option<&dyn AntiCheatProvider> {
        self.anti_cheat.as_deref()
    }

    pub fn anti_cheat_mut(&mut self) -> Option<&mut (dyn AntiCheatProvider + 'static)> {
        self.anti_cheat.as_deref_mut()
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.diagnostics.as_ref()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The sink every component reports through.
    pub fn error_sink(&self) -> &ErrorSink {
        &self.errors
    }

    fn refresh_diagnostics(&mut self) {
        let status = TransportStatus {
            name: self.transport.name().to_string(),
            latency_ms: self.transport.latency_ms(),
            ready: self.transport.is_ready(),
        };
        self.diagnostics.set_transport(status);
    }
}

impl std::fmt::Debug for NetworkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkService")
            .field("transport", &self.transport.name())
            .field(
                "anti_cheat",
                &self.anti_cheat.as_ref().map(|provider| provider.name()),
            )
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::names;
    use crate::config::{AntiCheatKind, TransportKind};
    use crate::error::ErrorLog;
    use crate::session::{LocalSessionManager, SessionManager, SessionRole};
    use netkit_event_bus::Handler;
    use parking_lot::Mutex;

    /// Services are one-per-process; tests that build one take this lock.
    static SERVICE_LOCK: Mutex<()> = parking_lot::const_mutex(());

    fn direct_caps() -> CapabilityRegistry {
        CapabilityRegistry::empty().with(names::DIRECT_SOCKET)
    }

    #[test]
    fn test_second_service_is_rejected_until_drop() {
        let _lock = SERVICE_LOCK.lock();
        let bus = Arc::new(EventBus::new());

        let first = NetworkService::builder(NetworkConfig::default())
            .capabilities(direct_caps())
            .event_bus(bus.clone())
            .build()
            .unwrap();
        assert!(NetworkService::is_running());

        let second = NetworkService::builder(NetworkConfig::default())
            .capabilities(direct_caps())
            .event_bus(bus.clone())
            .build();
        assert!(matches!(second, Err(NetworkError::ServiceAlreadyRunning)));

        drop(first);
        assert!(!NetworkService::is_running());

        let third = NetworkService::builder(NetworkConfig::default())
            .capabilities(direct_caps())
            .event_bus(bus)
            .build();
        assert!(third.is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected_without_taking_slot() {
        let _lock = SERVICE_LOCK.lock();
        let config = NetworkConfig {
            max_relay_connections: 0,
            ..NetworkConfig::default()
        };

        let result = NetworkService::builder(config).build();
        assert!(matches!(result, Err(NetworkError::InvalidConfig(_))));
        assert!(!NetworkService::is_running());
    }

    #[test]
    fn test_errors_are_forwarded_as_notices() {
        let _lock = SERVICE_LOCK.lock();
        let bus = Arc::new(EventBus::new());
        let log = ErrorLog::new();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        bus.subscribe(&Handler::new(move |notice: &NetworkNotice| {
            sink.lock().push(notice.message.clone());
            Ok(())
        }));

        let config = NetworkConfig {
            transport_kind: TransportKind::DirectSocketPrimary,
            ..NetworkConfig::default()
        };
        let service = NetworkService::builder(config)
            .capabilities(CapabilityRegistry::empty())
            .event_bus(bus)
            .error_sink(log.sink())
            .build()
            .unwrap();

        assert!(service.transport().is_offline());
        assert_eq!(log.len(), 1);
        assert_eq!(*notices.lock(), vec![log.entries()[0].to_string()]);
    }

    #[test]
    fn test_violations_reach_the_bus() {
        let _lock = SERVICE_LOCK.lock();
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(&Handler::new(move |violation: &Violation| {
            sink.lock().push(violation.clone());
            Ok(())
        }));

        let service = NetworkService::builder(NetworkConfig::default())
            .capabilities(direct_caps())
            .event_bus(bus)
            .error_sink(ErrorSink::silent())
            .build()
            .unwrap();

        let provider = service.anti_cheat().unwrap();
        assert!(provider.is_enabled());
        assert!(provider.raise(Violation::new("impossible jump", 80)));
        assert_eq!(seen.lock()[0].message, "impossible jump");
    }

    #[test]
    fn test_no_anti_cheat_when_none() {
        let _lock = SERVICE_LOCK.lock();
        let config = NetworkConfig {
            anti_cheat_kind: AntiCheatKind::None,
            ..NetworkConfig::default()
        };
        let mut service = NetworkService::builder(config)
            .capabilities(direct_caps())
            .event_bus(Arc::new(EventBus::new()))
            .build()
            .unwrap();

        assert!(service.anti_cheat().is_none());
        assert!(service.anti_cheat_mut().is_none());
    }

    #[test]
    fn test_tick_toggles_overlay_on_key() {
        let _lock = SERVICE_LOCK.lock();
        let mut service = NetworkService::builder(NetworkConfig::default())
            .capabilities(direct_caps())
            .event_bus(Arc::new(EventBus::new()))
            .build()
            .unwrap();
        assert!(service.diagnostics().is_visible());

        service.tick(&NoInput, Duration::from_millis(16));
        assert!(service.diagnostics().is_visible());

        service.tick(&|key: KeyCode| key == KeyCode::F9, Duration::from_millis(16));
        assert!(!service.diagnostics().is_visible());

        service.tick(&|key: KeyCode| key == KeyCode::F1, Duration::from_millis(16));
        assert!(!service.diagnostics().is_visible());
    }

    #[test]
    fn test_server_or_offline() {
        let _lock = SERVICE_LOCK.lock();
        let manager = Arc::new(LocalSessionManager::new());
        let context = HostContext::new().with_session_manager(manager.clone());
        let config = NetworkConfig {
            transport_kind: TransportKind::DirectSocketPrimary,
            ..NetworkConfig::default()
        };

        let mut service = NetworkService::builder(config)
            .capabilities(direct_caps())
            .context(context)
            .event_bus(Arc::new(EventBus::new()))
            .build()
            .unwrap();

        assert!(!service.is_server_or_offline());
        service.start_server();
        assert_eq!(manager.role(), SessionRole::Server);
        assert!(service.is_server_or_offline());

        manager.stop();
        service.start_client("10.1.1.1");
        assert!(!service.is_server_or_offline());
    }
}

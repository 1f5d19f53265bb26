//! The host environment transports initialize against.

use crate::relay::RelayService;
use crate::session::{LocalSessionManager, SessionManager};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Session objects that live in the host application.
///
/// Transports look for what they need here and install defaults when asked.
/// Clones share the same session manager and relay service.
#[derive(Clone, Default)]
pub struct HostContext {
    session_manager: Option<Arc<dyn SessionManager>>,
    relay_service: Option<Arc<dyn RelayService>>,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_manager(mut self, manager: Arc<dyn SessionManager>) -> Self {
        self.session_manager = Some(manager);
        self
    }

    pub fn with_relay_service(mut self, service: Arc<dyn RelayService>) -> Self {
        self.relay_service = Some(service);
        self
    }

    pub fn session_manager(&self) -> Option<Arc<dyn SessionManager>> {
        self.session_manager.clone()
    }

    pub fn relay_service(&self) -> Option<Arc<dyn RelayService>> {
        self.relay_service.clone()
    }

    pub fn set_relay_service(&mut self, service: Arc<dyn RelayService>) {
        self.relay_service = Some(service);
    }

    /// Returns the existing session manager or installs a [`LocalSessionManager`].
    pub fn find_or_create_session_manager(&mut self) -> Arc<dyn SessionManager> {
        if let Some(manager) = &self.session_manager {
            return manager.clone();
        }

        debug!("🧩 No session manager in host context, creating a local one");
        let manager: Arc<dyn SessionManager> = Arc::new(LocalSessionManager::new());
        self.session_manager = Some(manager.clone());
        manager
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field(
                "session_manager",
                &self.session_manager.as_ref().map(|m| m.name().to_string()),
            )
            .field("relay_service", &self.relay_service.is_some())
            .finish()
    }
}

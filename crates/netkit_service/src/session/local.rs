use super::{Endpoint, SessionManager, SessionRole};
use crate::error::SessionError;
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct SessionState {
    role: SessionRole,
    endpoint: Option<Endpoint>,
    backends: Vec<String>,
    rtt_ms: Option<u32>,
}

/// In-process session manager.
///
/// Records the role, endpoint and attached backends without opening sockets.
/// Round-trip time is injected with [`LocalSessionManager::set_rtt_ms`].
#[derive(Debug)]
pub struct LocalSessionManager {
    name: String,
    state: Mutex<SessionState>,
}

impl LocalSessionManager {
    pub fn new() -> Self {
        Self::named("local")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn set_rtt_ms(&self, rtt_ms: Option<u32>) {
        self.state.lock().rtt_ms = rtt_ms;
    }

    fn begin(&self, role: SessionRole, endpoint: Option<Endpoint>) -> Result<(), SessionError> {
        let mut state = self.state.lock();

        if state.role.is_active() {
            return Err(SessionError::AlreadyActive(state.role.to_string()));
        }
        if state.backends.is_empty() {
            return Err(SessionError::NoBackend);
        }

        if endpoint.is_some() {
            state.endpoint = endpoint;
        }
        state.role = role;

        match &state.endpoint {
            Some(endpoint) => info!("🎮 Session started as {} on {}", role, endpoint),
            None => info!("🎮 Session started as {}", role),
        }
        Ok(())
    }
}

impl Default for LocalSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager for LocalSessionManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, endpoint: Endpoint) {
        self.state.lock().endpoint = Some(endpoint);
    }

    fn start_host(&self) -> Result<(), SessionError> {
        self.begin(SessionRole::Host, None)
    }

    fn start_server(&self) -> Result<(), SessionError> {
        self.begin(SessionRole::Server, None)
    }

    fn start_client(&self, endpoint: &Endpoint) -> Result<(), SessionError> {
        self.begin(SessionRole::Client, Some(endpoint.clone()))
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        if state.role.is_active() {
            info!("🛑 Session stopped ({})", state.role);
        }
        state.role = SessionRole::Idle;
        state.endpoint = None;
    }

    fn attach_backend(&self, backend: &str) {
        let mut state = self.state.lock();
        if !state.backends.iter().any(|b| b == backend) {
            debug!("🔌 Attached backend '{}' to session manager '{}'", backend, self.name);
            state.backends.push(backend.to_string());
        }
    }

    fn backends(&self) -> Vec<String> {
        self.state.lock().backends.clone()
    }

    fn has_backend(&self, backend: &str) -> bool {
        self.state.lock().backends.iter().any(|b| b == backend)
    }

    fn role(&self) -> SessionRole {
        self.state.lock().role
    }

    fn endpoint(&self) -> Option<Endpoint> {
        self.state.lock().endpoint.clone()
    }

    fn rtt_ms(&self) -> Option<u32> {
        let state = self.state.lock();
        if state.role.is_active() {
            state.rtt_ms
        } else {
            None
        }
    }
}

use super::Transport;
use crate::config::NetworkConfig;
use crate::context::HostContext;
use crate::error::ErrorSink;
use tracing::{debug, info};

/// Loopback transport used whenever nothing better is available.
#[derive(Debug, Default)]
pub struct OfflineTransport;

impl OfflineTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for OfflineTransport {
    fn name(&self) -> &str {
        "Offline"
    }

    fn available(&self) -> bool {
        true
    }

    fn initialize(
        &mut self,
        _context: &mut HostContext,
        _config: &NetworkConfig,
        _errors: ErrorSink,
    ) {
        debug!("Offline transport initialized");
    }

    fn start_host(&mut self) {
        info!("Host (offline)");
    }

    fn start_client(&mut self, address_or_code: &str) {
        info!("Client (offline), ignoring '{}'", address_or_code);
    }

    fn start_server(&mut self) {
        info!("Server (offline)");
    }

    fn latency_ms(&self) -> u32 {
        0
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn is_offline(&self) -> bool {
        true
    }
}

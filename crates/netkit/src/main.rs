//! Headless host for the netkit network service.
//!
//! Loads the configuration, builds the service against the capabilities this
//! binary was compiled with, starts the requested session and drives the
//! service's cooperative tick until a shutdown signal arrives.

mod cli;
mod config;
mod input;
mod logging;
mod signals;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use netkit_service::{
    CapabilityRegistry, EventBus, Handler, HostContext, JoinCodeIssued, LocalSessionManager,
    NetworkService,
};

use crate::cli::{CliArgs, SessionStart};
use crate::config::AppConfig;
use crate::input::ConsoleInput;
use crate::signals::ShutdownReason;

const HEALTH_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    config_path: PathBuf,
    session: Option<SessionStart>,
}

impl Application {
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        // Load configuration first (before logging setup)
        let mut config = AppConfig::load_from_file(&args.config).await?;

        // Apply CLI overrides
        if let Some(transport) = args.transport {
            config.network.transport_kind = transport;
        }

        if let Some(log_level) = args.log_level.clone() {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            anyhow::bail!("Configuration validation failed: {}", e);
        }

        logging::setup_logging(&config.logging)?;

        info!("🚀 netkit v{}", env!("CARGO_PKG_VERSION"));
        info!("📂 Config: {}", args.config.display());

        Ok(Self {
            session: args.session_start(),
            config_path: args.config,
            config,
        })
    }

    fn build_service(&self, event_bus: Arc<EventBus>) -> anyhow::Result<NetworkService> {
        let capabilities = CapabilityRegistry::detect();
        let linked: Vec<&str> = capabilities.names().collect();
        info!("🔌 Linked capabilities: {:?}", linked);

        let context =
            HostContext::new().with_session_manager(Arc::new(LocalSessionManager::named("netkit")));

        let service = NetworkService::builder(self.config.network.clone())
            .capabilities(capabilities)
            .context(context)
            .event_bus(event_bus)
            .build()?;
        Ok(service)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("📋 Configuration Summary:");
        info!("  🚚 Transport: {}", self.config.network.transport_kind);
        info!("  🛡️ Anti-cheat: {}", self.config.network.anti_cheat_kind);
        info!("  👥 Max relay connections: {}", self.config.network.max_relay_connections);
        info!("  ⏱️ Tick interval: {}ms", self.config.runtime.tick_interval_ms);

        let event_bus = EventBus::global();
        let join_codes = Handler::named("netkit.join_code", |event: &JoinCodeIssued| {
            info!("🔑 Join code: {}", event.code);
            Ok(())
        });
        event_bus.subscribe(&join_codes);

        let mut service = self.build_service(event_bus.clone())?;

        match &self.session {
            Some(SessionStart::Host) => service.start_host(),
            Some(SessionStart::Server) => service.start_server(),
            Some(SessionStart::Client(target)) => service.start_client(target),
            None => info!(
                "💤 No session requested, pass --host, --server or --client (config: {})",
                self.config_path.display()
            ),
        }

        let mut input = ConsoleInput::spawn();

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.runtime.tick_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut health =
            tokio::time::interval_at(Instant::now() + HEALTH_INTERVAL, HEALTH_INTERVAL);

        let shutdown = signals::wait_for_shutdown();
        tokio::pin!(shutdown);

        let mut last_tick = Instant::now();
        let reason = loop {
            tokio::select! {
                result = &mut shutdown => {
                    match result {
                        Ok(reason) => break reason,
                        Err(e) => {
                            error!("❌ Signal handling failed: {}", e);
                            break ShutdownReason::Interrupt;
                        }
                    }
                }
                _ = ticker.tick() => {
                    let now = Instant::now();
                    input.drain();
                    service.tick(&input, now - last_tick);
                    last_tick = now;
                }
                _ = health.tick() => {
                    let stats = event_bus.stats();
                    let role = service
                        .context()
                        .session_manager()
                        .map(|manager| manager.role().to_string())
                        .unwrap_or_else(|| "none".to_string());
                    info!(
                        "📊 {} | role {} | {} ms | {} messages, {} handler failures",
                        service.transport().name(),
                        role,
                        service.transport().latency_ms(),
                        stats.messages_published,
                        stats.handler_failures
                    );
                }
            }
        };

        info!("🛑 Shutting down ({})", reason);
        if let Some(manager) = service.context().session_manager() {
            signals::end_session(manager.as_ref(), reason);
        }
        drop(service);

        event_bus.unsubscribe(&join_codes);
        info!("✅ Shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let app = Application::new(args).await?;
    app.run().await
}

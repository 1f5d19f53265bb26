//! Tracing subscriber setup for the netkit host.
//!
//! The configured level applies to the netkit crates. Everything else is held
//! at `warn` unless `RUST_LOG` says otherwise.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const NETKIT_TARGETS: [&str; 3] = ["netkit", "netkit_service", "netkit_event_bus"];
const DEPENDENCY_LEVEL: &str = "warn";

/// Filter directives for the configured level.
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![DEPENDENCY_LEVEL.to_string()];
    directives.extend(NETKIT_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Installs the global subscriber, JSON or human-readable per `json_format`.
pub fn setup_logging(config: &LoggingSettings) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(&config.level))?,
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_names(true);

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json().with_current_span(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init()?;
    }

    info!(
        "🔧 Logging initialized: {} for {} ({})",
        config.level,
        NETKIT_TARGETS.join(", "),
        if config.json_format { "json" } else { "text" }
    );
    Ok(())
}

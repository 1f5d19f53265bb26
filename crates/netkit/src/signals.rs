//! Shutdown handling for the tick loop.
//!
//! `wait_for_shutdown` resolves with the signal that ended the process, and
//! `end_session` tears down whatever session the service left running.

use netkit_service::{SessionManager, SessionRole};
use std::fmt;
use tokio::signal;
use tracing::info;

/// Why the host is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT, or Ctrl+C on Windows
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => write!(f, "interrupt"),
            ShutdownReason::Terminate => write!(f, "terminate"),
        }
    }
}

/// Waits for SIGINT or SIGTERM (Ctrl+C on Windows).
pub async fn wait_for_shutdown() -> anyhow::Result<ShutdownReason> {
    let reason = wait_for_signal().await?;
    info!("📡 Received {}", reason);
    Ok(reason)
}

#[cfg(unix)]
async fn wait_for_signal() -> anyhow::Result<ShutdownReason> {
    use signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let reason = tokio::select! {
        _ = sigint.recv() => ShutdownReason::Interrupt,
        _ = sigterm.recv() => ShutdownReason::Terminate,
    };
    Ok(reason)
}

#[cfg(windows)]
async fn wait_for_signal() -> anyhow::Result<ShutdownReason> {
    signal::ctrl_c().await?;
    Ok(ShutdownReason::Interrupt)
}

/// Stops the manager's session and returns the role it had.
pub fn end_session(manager: &dyn SessionManager, reason: ShutdownReason) -> SessionRole {
    let role = manager.role();
    if role.is_active() {
        info!(
            "⏹️ Ending {} session on '{}' ({})",
            role,
            manager.name(),
            reason
        );
        manager.stop();
    }
    role
}

#[cfg(test)]
mod tests {
    use super::*;
    use netkit_service::LocalSessionManager;

    #[test]
    fn test_end_session_stops_active_session() {
        let manager = LocalSessionManager::named("netkit");
        manager.attach_backend("tcp");
        manager.start_host().unwrap();

        assert_eq!(end_session(&manager, ShutdownReason::Terminate), SessionRole::Host);
        assert_eq!(manager.role(), SessionRole::Idle);
    }

    #[test]
    fn test_end_session_when_idle() {
        let manager = LocalSessionManager::named("netkit");
        assert_eq!(end_session(&manager, ShutdownReason::Interrupt), SessionRole::Idle);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::Interrupt.to_string(), "interrupt");
        assert_eq!(ShutdownReason::Terminate.to_string(), "terminate");
    }
}

//! Diagnostics sink contract and the default overlay.

use std::time::Duration;
use tracing::info;

const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshot of the transport pushed to diagnostics consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStatus {
    pub name: String,
    pub latency_ms: u32,
    pub ready: bool,
}

/// Consumer of transport health, typically an on-screen overlay.
pub trait DiagnosticsSink: Send {
    fn set_overlay_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    fn toggle(&mut self) {
        let visible = !self.is_visible();
        self.set_overlay_visible(visible);
    }

    fn set_transport(&mut self, status: TransportStatus);

    /// Called once per tick with the frame time.
    fn update(&mut self, _frame_time: Duration) {}
}

/// Default sink: renders an FPS/ping/transport line twice a second.
#[derive(Debug, Default)]
pub struct DiagnosticsOverlay {
    visible: bool,
    status: Option<TransportStatus>,
    elapsed: Duration,
    frames: u32,
    last_line: Option<String>,
}

impl DiagnosticsOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently rendered line.
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    pub fn status(&self) -> Option<&TransportStatus> {
        self.status.as_ref()
    }

    fn render(&mut self) {
        let seconds = self.elapsed.as_secs_f64();
        let fps = if seconds > 0.0 {
            (self.frames as f64 / seconds).round() as u32
        } else {
            0
        };
        let (ping, name) = match &self.status {
            Some(status) => (status.latency_ms, status.name.as_str()),
            None => (0, "none"),
        };

        let line = format!("FPS: {fps} • Ping: {ping} ms • Transport: {name}");
        if self.visible {
            info!("📊 {}", line);
        }
        self.last_line = Some(line);
        self.elapsed = Duration::ZERO;
        self.frames = 0;
    }
}

impl DiagnosticsSink for DiagnosticsOverlay {
    fn set_overlay_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_transport(&mut self, status: TransportStatus) {
        self.status = Some(status);
    }

    fn update(&mut self, frame_time: Duration) {
        self.frames += 1;
        self.elapsed += frame_time;
        if self.elapsed >= REFRESH_INTERVAL {
            self.render();
        }
    }
}

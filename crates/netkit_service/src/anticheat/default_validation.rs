use super::{AntiCheatProvider, Violation, ViolationDispatcher, ViolationHandler};
use crate::config::AntiCheatKind;
use crate::error::ErrorSink;
use tracing::{debug, info};

/// Confidence used by [`DefaultValidation::report_suspected`].
pub const SUSPECTED_CONFIDENCE: i32 = 80;

/// Built-in provider driven by the game's own server-side checks.
///
/// Always available. Gameplay validation code calls [`report`](Self::report)
/// when it rejects something a client did.
#[derive(Debug, Default)]
pub struct DefaultValidation {
    dispatcher: ViolationDispatcher,
}

impl DefaultValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, message: impl Into<String>, confidence: i32) -> bool {
        self.raise(Violation::new(message, confidence))
    }

    pub fn report_suspected(&self, message: impl Into<String>) -> bool {
        self.report(message, SUSPECTED_CONFIDENCE)
    }
}

impl AntiCheatProvider for DefaultValidation {
    fn name(&self) -> &str {
        "Default Validation"
    }

    fn kind(&self) -> AntiCheatKind {
        AntiCheatKind::DefaultValidation
    }

    fn available(&self) -> bool {
        true
    }

    fn initialize(&mut self, _errors: ErrorSink) {
        debug!("Default validation initialized");
    }

    fn enable(&mut self) {
        self.dispatcher.set_enabled(true);
        info!("🛡️ {} enabled", self.name());
    }

    fn disable(&mut self) {
        self.dispatcher.set_enabled(false);
    }

    fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    fn on_violation(&mut self, handler: ViolationHandler) {
        self.dispatcher.subscribe(handler);
    }

    fn raise(&self, violation: Violation) -> bool {
        self.dispatcher.raise(self.name(), violation)
    }
}

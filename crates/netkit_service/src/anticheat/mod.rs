//! Pluggable anti-cheat providers.
//!
//! Providers mirror the transport pattern: availability comes from a
//! capability probe, initialization reports problems through the
//! [`ErrorSink`](crate::error::ErrorSink), and detections are pushed to
//! observers as [`Violation`]s. Nothing here stops a session; what to do about
//! a violation is the host application's call.

mod default_validation;
mod factory;
mod sdk;

pub use default_validation::DefaultValidation;
pub use factory::AntiCheatFactory;
pub use sdk::SdkProvider;

use crate::config::AntiCheatKind;
use crate::error::ErrorSink;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Suspicion score in `0..=100`. Zero is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Confidence(u8);

impl Confidence {
    pub const INFORMATIONAL: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(100);

    /// Clamps `value` into range.
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_informational(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A detection reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    pub confidence: Confidence,
}

impl Violation {
    pub fn new(message: impl Into<String>, confidence: i32) -> Self {
        Self {
            message: message.into(),
            confidence: Confidence::new(confidence),
        }
    }

    pub fn is_informational(&self) -> bool {
        self.confidence.is_informational()
    }
}

pub type ViolationHandler = Arc<dyn Fn(&Violation) + Send + Sync>;

/// Observer list plus the monitoring switch shared by every provider.
#[derive(Default)]
pub struct ViolationDispatcher {
    observers: Vec<ViolationHandler>,
    enabled: bool,
}

impl ViolationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: ViolationHandler) {
        self.observers.push(handler);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Delivers `violation` to every observer. Dropped while disabled.
    pub fn raise(&self, source: &str, violation: Violation) -> bool {
        if !self.enabled {
            debug!(
                "{} dropped violation while disabled: {}",
                source, violation.message
            );
            return false;
        }
        for observer in &self.observers {
            observer(&violation);
        }
        true
    }
}

impl fmt::Debug for ViolationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViolationDispatcher")
            .field("observers", &self.observers.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// A pluggable anti-cheat back-end.
pub trait AntiCheatProvider: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> AntiCheatKind;

    /// Whether the provider's SDK is present in the build.
    fn available(&self) -> bool;

    /// Reports non-availability through `errors`. Never fails.
    fn initialize(&mut self, errors: ErrorSink);

    /// Starts monitoring. No-op when unavailable.
    fn enable(&mut self);

    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// Registers an observer for violations.
    fn on_violation(&mut self, handler: ViolationHandler);

    /// Forwards a detection to observers. Returns false if it was dropped.
    fn raise(&self, violation: Violation) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Confidence::new(-5).value(), 0);
        assert_eq!(Confidence::new(80).value(), 80);
        assert_eq!(Confidence::new(250).value(), 100);
        assert!(Confidence::new(0).is_informational());
        assert_eq!(Confidence::new(42).to_string(), "42%");
    }

    #[test]
    fn test_dispatcher_drops_while_disabled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut dispatcher = ViolationDispatcher::new();
        dispatcher.subscribe(Arc::new(move |v: &Violation| sink.lock().push(v.clone())));

        assert!(!dispatcher.raise("test", Violation::new("speed hack", 90)));
        assert!(seen.lock().is_empty());

        dispatcher.set_enabled(true);
        assert!(dispatcher.raise("test", Violation::new("speed hack", 90)));
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].confidence.value(), 90);
    }

    #[test]
    fn test_dispatcher_reaches_every_observer() {
        let count = Arc::new(Mutex::new(0));
        let mut dispatcher = ViolationDispatcher::new();
        for _ in 0..3 {
            let count = count.clone();
            dispatcher.subscribe(Arc::new(move |_: &Violation| *count.lock() += 1));
        }
        dispatcher.set_enabled(true);

        dispatcher.raise("test", Violation::new("info", 0));
        assert_eq!(*count.lock(), 3);
        assert_eq!(dispatcher.observer_count(), 3);
    }
}

use super::{AntiCheatProvider, DefaultValidation, SdkProvider};
use crate::capability::CapabilityRegistry;
use crate::config::AntiCheatKind;
use crate::error::{ErrorSink, NetworkError};
use tracing::info;

/// Builds the anti-cheat provider for a configured kind.
pub struct AntiCheatFactory;

impl AntiCheatFactory {
    /// The provider for `kind` as requested, or `None` for [`AntiCheatKind::None`].
    pub fn create(
        kind: AntiCheatKind,
        capabilities: &CapabilityRegistry,
    ) -> Option<Box<dyn AntiCheatProvider>> {
        match kind {
            AntiCheatKind::None => None,
            AntiCheatKind::DefaultValidation => Some(Box::new(DefaultValidation::new())),
            sdk => SdkProvider::new(sdk, capabilities)
                .map(|p| Box::new(p) as Box<dyn AntiCheatProvider>),
        }
    }

    /// Like [`create`](Self::create), but an unavailable SDK provider is
    /// reported once and replaced by [`DefaultValidation`].
    pub fn create_or_fallback(
        kind: AntiCheatKind,
        capabilities: &CapabilityRegistry,
        errors: &ErrorSink,
    ) -> Option<Box<dyn AntiCheatProvider>> {
        let provider = Self::create(kind, capabilities)?;
        if provider.available() {
            info!("🛡️ Selected anti-cheat: {}", provider.name());
            return Some(provider);
        }

        errors.report(NetworkError::missing(
            provider.name(),
            format!("{} not detected, falling back to Default Validation", provider.name()),
        ));
        Some(Box::new(DefaultValidation::new()))
    }
}

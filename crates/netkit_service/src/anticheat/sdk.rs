use super::{AntiCheatProvider, Violation, ViolationDispatcher, ViolationHandler};
use crate::capability::{names, CapabilityRegistry};
use crate::config::AntiCheatKind;
use crate::error::{ErrorSink, NetworkError};
use tracing::{debug, info};

struct SdkProfile {
    name: &'static str,
    markers: &'static [&'static str],
}

fn profile_for(kind: AntiCheatKind) -> Option<SdkProfile> {
    let profile = match kind {
        AntiCheatKind::Shield => SdkProfile {
            name: "Game Shield",
            markers: &[names::ANTICHEAT_SHIELD],
        },
        AntiCheatKind::Guard => SdkProfile {
            name: "Anti-Cheat Guard",
            markers: &[names::ANTICHEAT_GUARD],
        },
        AntiCheatKind::SteamVac => SdkProfile {
            name: "Valve Anti-Cheat",
            markers: &[names::ANTICHEAT_STEAM_CLIENT, names::ANTICHEAT_STEAMWORKS],
        },
        AntiCheatKind::EasyAntiCheat => SdkProfile {
            name: "Easy Anti-Cheat",
            markers: &[names::ANTICHEAT_EAC],
        },
        AntiCheatKind::BattlEye => SdkProfile {
            name: "BattlEye",
            markers: &[names::ANTICHEAT_BATTLEYE],
        },
        AntiCheatKind::None | AntiCheatKind::DefaultValidation => return None,
    };
    Some(profile)
}

/// Provider backed by a third-party anti-cheat SDK.
///
/// Available when any of the SDK's marker capabilities is present. A linked
/// SDK forwards its detections through [`AntiCheatProvider::raise`].
#[derive(Debug)]
pub struct SdkProvider {
    kind: AntiCheatKind,
    name: &'static str,
    markers: &'static [&'static str],
    available: bool,
    dispatcher: ViolationDispatcher,
}

impl SdkProvider {
    /// Returns `None` for kinds that are not SDK-backed.
    pub fn new(kind: AntiCheatKind, capabilities: &CapabilityRegistry) -> Option<Self> {
        let profile = profile_for(kind)?;
        Some(Self {
            kind,
            name: profile.name,
            markers: profile.markers,
            available: capabilities.probe_any(profile.markers).is_some(),
            dispatcher: ViolationDispatcher::new(),
        })
    }

    pub fn markers(&self) -> &'static [&'static str] {
        self.markers
    }
}

impl AntiCheatProvider for SdkProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> AntiCheatKind {
        self.kind
    }

    fn available(&self) -> bool {
        self.available
    }

    fn initialize(&mut self, errors: ErrorSink) {
        if self.available {
            debug!("{} SDK detected", self.name);
        } else {
            errors.report(NetworkError::missing(
                self.name,
                format!("{} not detected (looked for {})", self.name, self.markers.join(" or ")),
            ));
        }
    }

    fn enable(&mut self) {
        if !self.available {
            debug!("{} unavailable, not enabling", self.name);
            return;
        }
        self.dispatcher.set_enabled(true);
        info!("🛡️ {} monitoring enabled", self.name);
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
        self.dispatcher.raise(self.name, violation)
    }
}

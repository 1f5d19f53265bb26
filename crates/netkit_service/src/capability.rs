//! Build-time capability discovery.
//!
//! Optional backends are compiled in through Cargo features. Each feature maps
//! to one or more dotted capability names; transports and anti-cheat providers
//! ask the registry whether their marker names are present instead of trying
//! to reach the backend and failing.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use tracing::debug;

/// Well-known capability names.
pub mod names {
    pub const DIRECT_SOCKET: &str = "net.direct-socket";

    pub const RELAY_MANAGED_TRANSPORT: &str = "relay.managed.transport";
    pub const RELAY_MANAGED_SERVICE: &str = "relay.managed.service";

    pub const RELAY_EXTERNAL_STEAM_SOCKETS: &str = "relay.external.steam-sockets";
    pub const RELAY_EXTERNAL_STEAMWORKS: &str = "relay.external.steamworks";
    pub const RELAY_EXTERNAL_FACEPUNCH: &str = "relay.external.facepunch";

    pub const ANTICHEAT_SHIELD: &str = "anticheat.shield";
    pub const ANTICHEAT_GUARD: &str = "anticheat.guard";
    pub const ANTICHEAT_STEAM_CLIENT: &str = "anticheat.steam-client";
    pub const ANTICHEAT_STEAMWORKS: &str = "anticheat.steamworks";
    pub const ANTICHEAT_EAC: &str = "anticheat.eac";
    pub const ANTICHEAT_BATTLEYE: &str = "anticheat.battleye";

    /// External relay adapters, in the order they are tried.
    pub const RELAY_EXTERNAL_CANDIDATES: [&str; 3] = [
        RELAY_EXTERNAL_STEAM_SOCKETS,
        RELAY_EXTERNAL_STEAMWORKS,
        RELAY_EXTERNAL_FACEPUNCH,
    ];

    /// Both halves of the managed relay must be linked for it to work.
    pub const RELAY_MANAGED_REQUIRED: [&str; 2] = [RELAY_MANAGED_TRANSPORT, RELAY_MANAGED_SERVICE];
}

/// Cargo feature, whether this build enabled it, and the capabilities it links.
const FEATURES: &[(&str, bool, &[&str])] = &[
    ("direct-socket", cfg!(feature = "direct-socket"), &[names::DIRECT_SOCKET]),
    (
        "relay-managed",
        cfg!(feature = "relay-managed"),
        &names::RELAY_MANAGED_REQUIRED,
    ),
    (
        "relay-external",
        cfg!(feature = "relay-external"),
        &[names::RELAY_EXTERNAL_STEAM_SOCKETS],
    ),
    (
        "relay-external-steamworks",
        cfg!(feature = "relay-external-steamworks"),
        &[names::RELAY_EXTERNAL_STEAMWORKS],
    ),
    (
        "relay-external-facepunch",
        cfg!(feature = "relay-external-facepunch"),
        &[names::RELAY_EXTERNAL_FACEPUNCH],
    ),
    ("anticheat-shield", cfg!(feature = "anticheat-shield"), &[names::ANTICHEAT_SHIELD]),
    ("anticheat-guard", cfg!(feature = "anticheat-guard"), &[names::ANTICHEAT_GUARD]),
    ("anticheat-vac", cfg!(feature = "anticheat-vac"), &[names::ANTICHEAT_STEAM_CLIENT]),
    (
        "anticheat-steamworks",
        cfg!(feature = "anticheat-steamworks"),
        &[names::ANTICHEAT_STEAMWORKS],
    ),
    ("anticheat-eac", cfg!(feature = "anticheat-eac"), &[names::ANTICHEAT_EAC]),
    (
        "anticheat-battleye",
        cfg!(feature = "anticheat-battleye"),
        &[names::ANTICHEAT_BATTLEYE],
    ),
];

static DETECTED: Lazy<CapabilityRegistry> = Lazy::new(|| {
    let mut registry = CapabilityRegistry::empty();

    for (_, enabled, provided) in FEATURES {
        if *enabled {
            for name in provided.iter() {
                registry.insert(name);
            }
        }
    }

    debug!("🔎 Detected capabilities: {:?}", registry.names().collect::<Vec<_>>());
    registry
});

/// Boolean lookup of which optional backends are present in this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRegistry {
    present: BTreeSet<String>,
}

impl CapabilityRegistry {
    /// The registry resolved from this build's enabled features.
    pub fn detect() -> Self {
        DETECTED.clone()
    }

    /// A registry with nothing present; every backend falls back.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and hosts that link SDKs at runtime.
    pub fn with(mut self, name: &str) -> Self {
        self.insert(name);
        self
    }

    /// Marks a capability as present. Blank names are ignored.
    pub fn insert(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.present.insert(name.to_string());
        }
    }

    /// Returns whether `name` is present. Never fails: absence is the normal case.
    pub fn probe(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && self.present.contains(name)
    }

    /// Returns the first name from `candidates` that is present.
    pub fn probe_any<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.probe(name))
    }

    /// Returns true when every name in `required` is present.
    pub fn probe_all(&self, required: &[&str]) -> bool {
        required.iter().all(|name| self.probe(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.present.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

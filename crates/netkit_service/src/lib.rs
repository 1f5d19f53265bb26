//! # netkit Service
//!
//! Pluggable transport and anti-cheat orchestration for multiplayer sessions.
//!
//! The host application builds one [`NetworkService`] from a [`NetworkConfig`].
//! The service asks the [`TransportFactory`] and [`AntiCheatFactory`] for
//! concrete backends based on which optional backends this build links
//! ([`CapabilityRegistry`]), falls back to the offline transport and the
//! default validation provider when they are missing, and exposes three
//! lifecycle calls: `start_host`, `start_client` and `start_server`.
//!
//! Expected failures never surface as `Err`. They are reported through an
//! [`ErrorSink`] and forwarded to the event bus as [`NetworkNotice`]s.
//!
//! ## Example
//!
//! ```rust
//! use netkit_service::{CapabilityRegistry, NetworkConfig, NetworkService, NoInput};
//! use std::time::Duration;
//!
//! let mut service = NetworkService::builder(NetworkConfig::default())
//!     .capabilities(CapabilityRegistry::empty())
//!     .build()
//!     .expect("no other service is running");
//!
//! // Nothing is linked, so this runs offline.
//! assert!(service.transport().is_offline());
//! service.start_host();
//! service.tick(&NoInput, Duration::from_millis(16));
//! ```
//!
//! ## Build features
//!
//! | Feature | Capabilities |
//! |---------|--------------|
//! | `direct-socket` (default) | `net.direct-socket` |
//! | `relay-managed` | `relay.managed.transport`, `relay.managed.service` |
//! | `relay-external` | `relay.external.steam-sockets` |
//! | `relay-external-steamworks` | `relay.external.steamworks` |
//! | `relay-external-facepunch` | `relay.external.facepunch` |
//! | `anticheat-shield` | `anticheat.shield` |
//! | `anticheat-guard` | `anticheat.guard` |
//! | `anticheat-vac` | `anticheat.steam-client` |
//! | `anticheat-steamworks` | `anticheat.steamworks` |
//! | `anticheat-eac` | `anticheat.eac` |
//! | `anticheat-battleye` | `anticheat.battleye` |

pub mod anticheat;
pub mod capability;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod relay;
pub mod service;
pub mod session;
pub mod transport;

pub use anticheat::{
    AntiCheatFactory, AntiCheatProvider, Confidence, DefaultValidation, SdkProvider, Violation,
};
pub use capability::CapabilityRegistry;
pub use config::{AntiCheatKind, KeyCode, NetworkConfig, TransportKind};
pub use context::HostContext;
pub use diagnostics::{DiagnosticsOverlay, DiagnosticsSink, TransportStatus};
pub use error::{ErrorLog, ErrorSink, NetworkError, RelayError, SessionError};
pub use relay::{LocalRelayService, RelayService};
pub use service::{
    InputPoll, JoinCodeIssued, NetworkNotice, NetworkService, NetworkServiceBuilder, NoInput,
};
pub use session::{Endpoint, LocalSessionManager, SessionManager, SessionRole};
pub use transport::{Transport, TransportFactory};

// Re-export the event bus so hosts depend on one crate
pub use netkit_event_bus::{self as event_bus, EventBus, Handler};

//! # netkit Event Bus
//!
//! A process-wide, synchronous publish/subscribe registry keyed by message type.
//! Gameplay collaborators use it to react to session and anti-cheat state without
//! depending on the transport that produced it.
//!
//! ## Dispatch rules
//!
//! * Handlers for a type run in subscription order, once per publish.
//! * Registering the same [`Handler`] twice for one type is a no-op.
//! * `publish` dispatches over a snapshot of the subscriber list taken when the
//!   publish starts. Handlers may therefore subscribe or unsubscribe (themselves
//!   or others) while running: the current publish is unaffected, later publishes
//!   see the change.
//! * A handler that returns an error or panics is logged and counted in the
//!   returned [`DispatchReport`]; the remaining handlers still run and nothing
//!   propagates to the caller.
//!
//! ## Example
//!
//! ```rust
//! use netkit_event_bus::{EventBus, Handler};
//!
//! #[derive(Debug)]
//! struct DoorOpened { id: u32 }
//!
//! let bus = EventBus::new();
//! let handler = Handler::new(|event: &DoorOpened| {
//!     println!("door {} opened", event.id);
//!     Ok(())
//! });
//!
//! bus.subscribe(&handler);
//! let report = bus.publish(&DoorOpened { id: 7 });
//! assert_eq!(report.invoked, 1);
//! ```

mod error;
mod handler;
mod system;

pub use error::EventError;
pub use handler::Handler;
pub use system::{DispatchReport, EventBus, EventBusStats};

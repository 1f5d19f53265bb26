/// Event bus implementation split by responsibility
mod core;
mod emitters;
mod handlers;
mod stats;

pub use self::core::EventBus;
pub use stats::{DispatchReport, EventBusStats};

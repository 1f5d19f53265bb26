//! Relay rendezvous services.
//!
//! A relay lets peers meet through a third party using a short join code
//! instead of a direct address. The host allocates a slot, publishes the join
//! code, and clients redeem the code to join the same allocation.

mod local;

pub use local::LocalRelayService;

use crate::error::RelayError;
use async_trait::async_trait;

/// A relay slot owned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: String,
    pub max_connections: u32,
}

/// The result of redeeming a join code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedAllocation {
    pub allocation_id: String,
    pub join_code: String,
    /// 1-based index of this peer within the allocation
    pub connection_index: u32,
}

/// Client for a relay rendezvous service.
///
/// Every call may take several ticks to complete; transports drive the futures
/// from their `poll` instead of awaiting them on the caller's thread.
#[async_trait]
pub trait RelayService: Send + Sync {
    /// Signs in or otherwise prepares the service. Idempotent.
    async fn ensure_initialized(&self) -> Result<(), RelayError>;

    async fn create_allocation(&self, max_connections: u32) -> Result<Allocation, RelayError>;

    async fn join_code(&self, allocation_id: &str) -> Result<String, RelayError>;

    async fn join_allocation(&self, join_code: &str) -> Result<JoinedAllocation, RelayError>;

    /// Frees an allocation and retires its join code.
    async fn release_allocation(&self, allocation_id: &str) -> Result<(), RelayError>;
}

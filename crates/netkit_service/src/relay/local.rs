use super::{Allocation, JoinedAllocation, RelayService};
use crate::error::RelayError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tracing::{debug, info};
use uuid::Uuid;

const JOIN_CODE_LEN: usize = 6;
/// No 0/O or 1/I, so codes survive being read aloud.
const JOIN_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug)]
struct AllocationEntry {
    allocation: Allocation,
    join_code: String,
    connections: u32,
}

/// In-process relay rendezvous.
///
/// Allocations are keyed by id, join codes map back to them. Lookups by code
/// are case-insensitive. `latency_polls` makes every call stay pending for that
/// many polls so completion is only observable on a later tick.
#[derive(Debug, Default)]
pub struct LocalRelayService {
    initialized: AtomicBool,
    allocations: DashMap<String, AllocationEntry>,
    codes: DashMap<String, String>,
    latency_polls: u32,
}

impl LocalRelayService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency_polls(latency_polls: u32) -> Self {
        Self {
            latency_polls,
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Peers that joined through `join_code`, if the code is known.
    pub fn connections(&self, join_code: &str) -> Option<u32> {
        let id = self.codes.get(&normalize(join_code))?.value().clone();
        self.allocations.get(&id).map(|entry| entry.connections)
    }

    fn delay(&self) -> Countdown {
        Countdown {
            remaining: self.latency_polls,
        }
    }

    fn require_initialized(&self) -> Result<(), RelayError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(RelayError::NotInitialized)
        }
    }

    fn unique_code(&self) -> String {
        loop {
            let code = generate_join_code();
            if !self.codes.contains_key(&code) {
                return code;
            }
        }
    }
}

#[async_trait]
impl RelayService for LocalRelayService {
    async fn ensure_initialized(&self) -> Result<(), RelayError> {
        self.delay().await;
        if !self.initialized.swap(true, Ordering::AcqRel) {
            debug!("🔐 Local relay service signed in");
        }
        Ok(())
    }

    async fn create_allocation(&self, max_connections: u32) -> Result<Allocation, RelayError> {
        self.delay().await;
        self.require_initialized()?;
        if max_connections == 0 {
            return Err(RelayError::InvalidConnectionLimit(max_connections));
        }

        let allocation = Allocation {
            id: Uuid::new_v4().to_string(),
            max_connections,
        };
        let join_code = self.unique_code();

        self.codes.insert(join_code.clone(), allocation.id.clone());
        self.allocations.insert(
            allocation.id.clone(),
            AllocationEntry {
                allocation: allocation.clone(),
                join_code: join_code.clone(),
                connections: 0,
            },
        );

        info!(
            "📡 Relay allocation {} created for {} connections (code {})",
            allocation.id, max_connections, join_code
        );
        Ok(allocation)
    }

    async fn join_code(&self, allocation_id: &str) -> Result<String, RelayError> {
        self.delay().await;
        self.require_initialized()?;
        self.allocations
            .get(allocation_id)
            .map(|entry| entry.join_code.clone())
            .ok_or_else(|| RelayError::UnknownAllocation(allocation_id.to_string()))
    }

    async fn join_allocation(&self, join_code: &str) -> Result<JoinedAllocation, RelayError> {
        self.delay().await;
        self.require_initialized()?;

        let code = normalize(join_code);
        let allocation_id = self
            .codes
            .get(&code)
            .map(|id| id.value().clone())
            .ok_or_else(|| RelayError::UnknownJoinCode(join_code.trim().to_string()))?;

        let mut entry = self
            .allocations
            .get_mut(&allocation_id)
            .ok_or_else(|| RelayError::UnknownAllocation(allocation_id.clone()))?;

        if entry.connections >= entry.allocation.max_connections {
            return Err(RelayError::AllocationFull {
                allocation: allocation_id,
                max: entry.allocation.max_connections,
            });
        }

        entry.connections += 1;
        debug!(
            "🤝 Peer {} joined relay allocation {}",
            entry.connections, allocation_id
        );

        Ok(JoinedAllocation {
            allocation_id,
            join_code: code,
            connection_index: entry.connections,
        })
    }

    async fn release_allocation(&self, allocation_id: &str) -> Result<(), RelayError> {
        self.delay().await;
        self.require_initialized()?;

        let (_, entry) = self
            .allocations
            .remove(allocation_id)
            .ok_or_else(|| RelayError::UnknownAllocation(allocation_id.to_string()))?;
        self.codes.remove(&entry.join_code);

        info!(
            "🗑️ Relay allocation {} released (code {})",
            allocation_id, entry.join_code
        );
        Ok(())
    }
}

fn normalize(join_code: &str) -> String {
    join_code.trim().to_ascii_uppercase()
}

fn generate_join_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(JOIN_CODE_LEN)
        .map(|byte| JOIN_CODE_ALPHABET[(*byte as usize) % JOIN_CODE_ALPHABET.len()] as char)
        .collect()
}

/// Stays pending for `remaining` polls, waking itself each time.
struct Countdown {
    remaining: u32,
}

impl Future for Countdown {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;

    async fn ready_service() -> LocalRelayService {
        let relay = LocalRelayService::new();
        relay.ensure_initialized().await.unwrap();
        relay
    }

    #[test]
    fn test_join_code_shape() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), JOIN_CODE_LEN);
            assert!(code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_requires_initialization() {
        let relay = LocalRelayService::new();
        assert_eq!(relay.create_allocation(4).await, Err(RelayError::NotInitialized));

        relay.ensure_initialized().await.unwrap();
        relay.ensure_initialized().await.unwrap();
        assert!(relay.is_initialized());
        assert!(relay.create_allocation(4).await.is_ok());
    }

    #[tokio::test]
    async fn test_allocate_and_join() {
        let relay = ready_service().await;
        let allocation = relay.create_allocation(2).await.unwrap();
        let code = relay.join_code(&allocation.id).await.unwrap();

        let joined = relay.join_allocation(&code.to_lowercase()).await.unwrap();
        assert_eq!(joined.allocation_id, allocation.id);
        assert_eq!(joined.join_code, code);
        assert_eq!(joined.connection_index, 1);
        assert_eq!(relay.connections(&code), Some(1));
        assert_eq!(relay.allocation_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_code_and_allocation() {
        let relay = ready_service().await;

        assert_eq!(
            relay.join_allocation(" nope99 ").await,
            Err(RelayError::UnknownJoinCode("nope99".to_string()))
        );
        assert!(matches!(
            relay.join_code("missing").await,
            Err(RelayError::UnknownAllocation(_))
        ));
    }

    #[tokio::test]
    async fn test_release_retires_code() {
        let relay = ready_service().await;
        let allocation = relay.create_allocation(2).await.unwrap();
        let code = relay.join_code(&allocation.id).await.unwrap();

        relay.release_allocation(&allocation.id).await.unwrap();
        assert_eq!(relay.allocation_count(), 0);
        assert_eq!(relay.connections(&code), None);
        assert!(matches!(
            relay.join_allocation(&code).await,
            Err(RelayError::UnknownJoinCode(_))
        ));
        assert!(matches!(
            relay.release_allocation(&allocation.id).await,
            Err(RelayError::UnknownAllocation(_))
        ));
    }

    #[tokio::test]
    async fn test_allocation_connection_limit() {
        let relay = ready_service().await;
        let allocation = relay.create_allocation(1).await.unwrap();
        let code = relay.join_code(&allocation.id).await.unwrap();

        assert!(relay.join_allocation(&code).await.is_ok());
        assert!(matches!(
            relay.join_allocation(&code).await,
            Err(RelayError::AllocationFull { max: 1, .. })
        ));
        assert_eq!(
            relay.create_allocation(0).await,
            Err(RelayError::InvalidConnectionLimit(0))
        );
    }

    #[test]
    fn test_latency_keeps_future_pending() {
        let relay = LocalRelayService::with_latency_polls(2);
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut pending = relay.ensure_initialized();

        assert!(pending.as_mut().poll(&mut cx).is_pending());
        assert!(pending.as_mut().poll(&mut cx).is_pending());
        assert_eq!(pending.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        assert!(relay.is_initialized());
    }
}

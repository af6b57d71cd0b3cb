//! Swap Registry Module
//!
//! The registry is the single source of truth for swap state and the
//! only shared mutable state in the coordinator. All writes are
//! compare-and-swap guarded on the stored status, and per-swap in-flight
//! operation claims provide mutual exclusion for ledger-driving
//! operations without holding a lock across awaited calls.
//!
//! Terminal swaps are immutable and archived, never deleted: they are
//! the audit trail for fund movements.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::SwapError;
use crate::swap::{Swap, SwapFilter, SwapStatus};

// ============================================================================
// IN-FLIGHT OPERATION CLAIMS
// ============================================================================

/// Ledger-driving operation kinds, claimed one-at-a-time per swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Source-side lock submission.
    LockSource,
    /// Destination-side lock submission.
    LockDest,
    /// Reveal/withdraw sequence.
    Withdraw,
    /// Refund sequence.
    Refund,
}

struct Entry {
    swap: Swap,
    in_flight: Option<OpKind>,
}

// ============================================================================
// REGISTRY
// ============================================================================

/// In-memory map from swap id to swap state with CAS semantics.
///
/// The contract here (get/put/CAS) is what a durable store would also
/// satisfy; the coordinator is agnostic to the backing.
#[derive(Clone, Default)]
pub struct SwapRegistry {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl SwapRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new swap. Fails if the id is already registered
    /// (idempotent initiation is handled above this layer by the
    /// deterministic contract id).
    pub async fn put(&self, swap: Swap) -> Result<(), SwapError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&swap.swap_id) {
            return Err(SwapError::Internal(format!(
                "swap {} already registered",
                swap.swap_id
            )));
        }
        entries.insert(
            swap.swap_id.clone(),
            Entry {
                swap,
                in_flight: None,
            },
        );
        Ok(())
    }

    /// Returns a copy of the swap, or `SwapNotFound`.
    pub async fn get(&self, swap_id: &str) -> Result<Swap, SwapError> {
        self.entries
            .read()
            .await
            .get(swap_id)
            .map(|e| e.swap.clone())
            .ok_or_else(|| SwapError::SwapNotFound(swap_id.to_string()))
    }

    /// Returns all swaps passing the filter.
    pub async fn list(&self, filter: &SwapFilter) -> Vec<Swap> {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| filter.matches(&e.swap))
            .map(|e| e.swap.clone())
            .collect()
    }

    /// Returns all swaps in a non-terminal status (poller work set).
    pub async fn non_terminal(&self) -> Vec<Swap> {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.swap.status.is_terminal())
            .map(|e| e.swap.clone())
            .collect()
    }

    /// Compare-and-swap status transition.
    ///
    /// Fails with `StaleState` if `guard` does not match the stored
    /// status, which is how the loser of a concurrent transition finds
    /// out. Terminal statuses can never be left.
    pub async fn update_status(
        &self,
        swap_id: &str,
        new_status: SwapStatus,
        guard: SwapStatus,
    ) -> Result<(), SwapError> {
        self.update_guarded(swap_id, guard, |swap| swap.status = new_status)
            .await
            .map(|_| ())
    }

    /// Compare-and-swap with field mutation under one write acquisition.
    /// Returns the updated swap.
    pub async fn update_guarded<F>(
        &self,
        swap_id: &str,
        guard: SwapStatus,
        mutate: F,
    ) -> Result<Swap, SwapError>
    where
        F: FnOnce(&mut Swap),
    {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(swap_id)
            .ok_or_else(|| SwapError::SwapNotFound(swap_id.to_string()))?;
        if entry.swap.status != guard || entry.swap.status.is_terminal() {
            return Err(SwapError::StaleState {
                guard,
                actual: entry.swap.status,
            });
        }
        mutate(&mut entry.swap);
        Ok(entry.swap.clone())
    }

    /// Mutation without a status guard, used by reconciliation when the
    /// ledger is authoritative. Terminal statuses remain immutable.
    pub async fn force_update<F>(&self, swap_id: &str, mutate: F) -> Result<Swap, SwapError>
    where
        F: FnOnce(&mut Swap),
    {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(swap_id)
            .ok_or_else(|| SwapError::SwapNotFound(swap_id.to_string()))?;
        if entry.swap.status.is_terminal() {
            return Err(SwapError::InvalidState {
                expected: entry.swap.status,
                actual: entry.swap.status,
            });
        }
        mutate(&mut entry.swap);
        Ok(entry.swap.clone())
    }

    /// Claims the in-flight slot for a ledger-driving operation.
    ///
    /// Succeeds only when the stored status matches `guard` and no other
    /// operation is in flight; the check and the claim happen under the
    /// same write acquisition, so exactly one of two concurrent callers
    /// wins. The loser observes `StaleState`.
    pub async fn claim(
        &self,
        swap_id: &str,
        guard: SwapStatus,
        op: OpKind,
    ) -> Result<(), SwapError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(swap_id)
            .ok_or_else(|| SwapError::SwapNotFound(swap_id.to_string()))?;
        if entry.swap.status != guard || entry.in_flight.is_some() {
            return Err(SwapError::StaleState {
                guard,
                actual: entry.swap.status,
            });
        }
        entry.in_flight = Some(op);
        Ok(())
    }

    /// Releases a previously claimed in-flight slot.
    pub async fn release(&self, swap_id: &str, op: OpKind) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(swap_id) {
            if entry.in_flight == Some(op) {
                entry.in_flight = None;
            }
        }
    }

    /// Whether an operation is currently in flight for the swap.
    pub async fn is_in_flight(&self, swap_id: &str) -> bool {
        self.entries
            .read()
            .await
            .get(swap_id)
            .map(|e| e.in_flight.is_some())
            .unwrap_or(false)
    }
}

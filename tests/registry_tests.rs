//! Unit tests for the swap registry
//!
//! Tests compare-and-swap transitions, terminal immutability, and the
//! in-flight operation claims used for per-swap mutual exclusion.

use htlc_coordinator::error::SwapError;
use htlc_coordinator::registry::{OpKind, SwapRegistry};
use htlc_coordinator::swap::{SwapFilter, SwapStatus};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{build_test_harness, default_intent};

/// Registers a fresh swap through the coordinator and returns its id
/// together with the registry handle.
async fn registered_swap() -> (SwapRegistry, String) {
    let harness = build_test_harness();
    let swap = harness
        .coordinator
        .initiate_swap(default_intent())
        .await
        .unwrap();
    (harness.coordinator.registry().clone(), swap.swap_id)
}

// ============================================================================
// CAS TRANSITION TESTS
// ============================================================================

/// Test that a matching guard permits a status transition
/// What is tested: update_status with the stored status as guard
/// Why: This is the only legal way to move a swap forward
#[tokio::test]
async fn test_update_status_with_matching_guard() {
    let (registry, swap_id) = registered_swap().await;

    registry
        .update_status(&swap_id, SwapStatus::SourceLocked, SwapStatus::Created)
        .await
        .unwrap();

    let swap = registry.get(&swap_id).await.unwrap();
    assert_eq!(swap.status, SwapStatus::SourceLocked);
}

/// Test that a stale guard is rejected
/// What is tested: update_status against a status that no longer matches
/// Why: The loser of a concurrent transition must observe StaleState and
/// must not overwrite the winner's work
#[tokio::test]
async fn test_update_status_stale_guard_rejected() {
    let (registry, swap_id) = registered_swap().await;

    registry
        .update_status(&swap_id, SwapStatus::SourceLocked, SwapStatus::Created)
        .await
        .unwrap();

    let stale = registry
        .update_status(&swap_id, SwapStatus::SourceLocked, SwapStatus::Created)
        .await;
    assert!(matches!(
        stale,
        Err(SwapError::StaleState {
            guard: SwapStatus::Created,
            actual: SwapStatus::SourceLocked,
        })
    ));
}

/// Test that terminal statuses are immutable
/// What is tested: No guarded or forced update can leave a terminal status
/// Why: Terminal swaps are the audit trail for fund movements
#[tokio::test]
async fn test_terminal_status_immutable() {
    let (registry, swap_id) = registered_swap().await;

    registry
        .force_update(&swap_id, |s| s.status = SwapStatus::Failed)
        .await
        .unwrap();

    let guarded = registry
        .update_status(&swap_id, SwapStatus::Created, SwapStatus::Failed)
        .await;
    assert!(matches!(guarded, Err(SwapError::StaleState { .. })));

    let forced = registry
        .force_update(&swap_id, |s| s.status = SwapStatus::Created)
        .await;
    assert!(matches!(forced, Err(SwapError::InvalidState { .. })));

    let swap = registry.get(&swap_id).await.unwrap();
    assert_eq!(swap.status, SwapStatus::Failed);
}

/// Test that duplicate swap ids are rejected
/// What is tested: put with an already-registered id fails
/// Why: Two states under one id would desynchronize the protocol
#[tokio::test]
async fn test_duplicate_swap_id_rejected() {
    let (registry, swap_id) = registered_swap().await;
    let swap = registry.get(&swap_id).await.unwrap();

    let result = registry.put(swap).await;
    assert!(matches!(result, Err(SwapError::Internal(_))));
}

/// Test the not-found path
/// What is tested: get and update on an unknown id
/// Why: Callers distinguish missing swaps from state conflicts
#[tokio::test]
async fn test_unknown_swap_id() {
    let registry = SwapRegistry::new();

    let get = registry.get("no-such-swap").await;
    assert!(matches!(get, Err(SwapError::SwapNotFound(_))));

    let update = registry
        .update_status("no-such-swap", SwapStatus::Failed, SwapStatus::Created)
        .await;
    assert!(matches!(update, Err(SwapError::SwapNotFound(_))));
}

// ============================================================================
// IN-FLIGHT CLAIM TESTS
// ============================================================================

/// Test that exactly one claim wins per swap
/// What is tested: A second claim fails until the first is released
/// Why: Ledger-driving operations must be mutually exclusive per swap
/// without holding a lock across awaited calls
#[tokio::test]
async fn test_claim_mutual_exclusion() {
    let (registry, swap_id) = registered_swap().await;

    registry
        .claim(&swap_id, SwapStatus::Created, OpKind::LockSource)
        .await
        .unwrap();
    assert!(registry.is_in_flight(&swap_id).await);

    let second = registry
        .claim(&swap_id, SwapStatus::Created, OpKind::LockSource)
        .await;
    assert!(matches!(second, Err(SwapError::StaleState { .. })));

    registry.release(&swap_id, OpKind::LockSource).await;
    assert!(!registry.is_in_flight(&swap_id).await);

    registry
        .claim(&swap_id, SwapStatus::Created, OpKind::LockSource)
        .await
        .unwrap();
}

/// Test that a claim checks the status guard
/// What is tested: Claiming against a non-matching status fails
/// Why: A claim for the wrong phase must lose exactly like a CAS miss
#[tokio::test]
async fn test_claim_requires_matching_status() {
    let (registry, swap_id) = registered_swap().await;

    let result = registry
        .claim(&swap_id, SwapStatus::DestLocked, OpKind::Withdraw)
        .await;
    assert!(matches!(result, Err(SwapError::StaleState { .. })));
    assert!(!registry.is_in_flight(&swap_id).await);
}

// ============================================================================
// LISTING TESTS
// ============================================================================

/// Test status filtering in list
/// What is tested: SwapFilter narrows results by status
/// Why: Operators query the registry by lifecycle phase
#[tokio::test]
async fn test_list_filters_by_status() {
    let harness = build_test_harness();
    let registry = harness.coordinator.registry().clone();

    let first = harness
        .coordinator
        .initiate_swap(default_intent())
        .await
        .unwrap();
    let mut second_intent = default_intent();
    second_intent.swap_id = Some("second-swap".to_string());
    harness
        .coordinator
        .initiate_swap(second_intent)
        .await
        .unwrap();

    registry
        .update_status(&first.swap_id, SwapStatus::SourceLocked, SwapStatus::Created)
        .await
        .unwrap();

    let created = registry
        .list(&SwapFilter {
            status: Some(SwapStatus::Created),
            ..Default::default()
        })
        .await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].swap_id, "second-swap");

    let all = registry.list(&SwapFilter::default()).await;
    assert_eq!(all.len(), 2);

    let non_terminal = registry.non_terminal().await;
    assert_eq!(non_terminal.len(), 2);
}

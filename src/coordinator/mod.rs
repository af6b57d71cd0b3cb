//! Swap Coordinator Module
//!
//! The coordinator owns the swap lifecycle and drives the two ledger
//! adapters through the lock -> confirm -> lock -> reveal -> settle
//! sequence, exposing the refund path on timeout.
//!
//! ## Concurrency model
//!
//! Operations on a single swap are serialized through the registry's
//! CAS-guarded in-flight claims, never by holding a lock across an
//! awaited ledger call. The loser of a claim race waits for the
//! winner's stored transaction reference (idempotent-retry semantics).
//!
//! ## Trust rules
//!
//! The coordinator never assumes a submission succeeded or failed: an
//! ambiguous outcome (deadline expiry) leaves the registry status
//! unchanged and is resolved by reading authoritative ledger state.
//! Client-claimed preimages are accepted only once the claimed side's
//! ledger shows `withdrawn == true`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{validate_address, Config};
use crate::error::{LedgerError, SwapError};
use crate::htlc::{
    compute_hashlock, derive_dest_timelock, generate_contract_id, validate_timelock, Preimage,
};
use crate::ledger::{evm::to_base_units, LedgerAdapter, LockParams};
use crate::registry::{OpKind, SwapRegistry};
use crate::swap::{ChainId, Swap, SwapFilter, SwapIntent, SwapStatus};

/// How long a claim loser waits for the winner's stored reference.
const CLAIM_WAIT_ATTEMPTS: u32 = 40;
const CLAIM_WAIT_INTERVAL: Duration = Duration::from_millis(25);

// ============================================================================
// HEALTH REPORT
// ============================================================================

/// Coordinator and adapter liveness, for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Coordinator process status.
    pub coordinator_status: String,
    /// Per-adapter probe results.
    pub adapter_statuses: Vec<AdapterHealth>,
}

/// Probe result for one ledger adapter.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterHealth {
    /// Chain the adapter serves.
    pub chain: ChainId,
    /// "ok" or the probe failure message.
    pub status: String,
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Cross-chain atomic-swap coordinator.
///
/// Constructed with explicit references to its collaborators; there is
/// no ambient global state.
pub struct SwapCoordinator {
    config: Arc<Config>,
    registry: SwapRegistry,
    clock: Arc<dyn Clock>,
    evm: Arc<dyn LedgerAdapter>,
    stellar: Arc<dyn LedgerAdapter>,
    ledger_timeout: Duration,
}

impl SwapCoordinator {
    /// Creates a coordinator wired to its adapters, registry, and clock.
    pub fn new(
        config: Arc<Config>,
        evm: Arc<dyn LedgerAdapter>,
        stellar: Arc<dyn LedgerAdapter>,
        registry: SwapRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger_timeout = Duration::from_millis(config.coordinator.ledger_timeout_ms);
        Self {
            config,
            registry,
            clock,
            evm,
            stellar,
            ledger_timeout,
        }
    }

    /// Registry handle, shared with the reconciliation poller.
    pub fn registry(&self) -> &SwapRegistry {
        &self.registry
    }

    /// Adapter for a chain. The single point where chain identity is
    /// dispatched.
    pub fn adapter(&self, chain: ChainId) -> &Arc<dyn LedgerAdapter> {
        match chain {
            ChainId::Evm => &self.evm,
            ChainId::Stellar => &self.stellar,
        }
    }

    /// Current time from the injected clock, shared with the poller.
    pub(crate) fn unix_now(&self) -> u64 {
        self.clock.unix_now()
    }

    /// Operator address able to claim locks on the given chain.
    fn operator_addr(&self, chain: ChainId) -> &str {
        match chain {
            ChainId::Evm => &self.config.evm_chain.sender_addr,
            ChainId::Stellar => &self.config.stellar_chain.operator_addr,
        }
    }

    /// Wraps a ledger call in the configured deadline. Expiry leaves
    /// the swap status untouched; the transaction may still have landed
    /// and the poller will discover the true outcome.
    pub(crate) async fn with_deadline<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.ledger_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Unreachable(
                "ledger call deadline exceeded".to_string(),
            )),
        }
    }

    /// Claim-loser path: waits for the winner to store a reference.
    async fn await_stored<F>(
        &self,
        swap_id: &str,
        expected: SwapStatus,
        extract: F,
    ) -> Result<String, SwapError>
    where
        F: Fn(&Swap) -> Option<String>,
    {
        for _ in 0..CLAIM_WAIT_ATTEMPTS {
            let swap = self.registry.get(swap_id).await?;
            if let Some(reference) = extract(&swap) {
                return Ok(reference);
            }
            if !self.registry.is_in_flight(swap_id).await {
                // Winner finished without storing a reference: its call
                // failed, so surface the sequencing error for a retry.
                return Err(SwapError::InvalidState {
                    expected,
                    actual: swap.status,
                });
            }
            tokio::time::sleep(CLAIM_WAIT_INTERVAL).await;
        }
        Err(SwapError::Internal(format!(
            "timed out waiting for concurrent operation on swap {}",
            swap_id
        )))
    }

    // ========================================================================
    // INITIATION
    // ========================================================================

    /// Validates a swap intent, derives the HTLC parameters, and
    /// persists a `created` swap.
    pub async fn initiate_swap(&self, intent: SwapIntent) -> Result<Swap, SwapError> {
        if intent.source_chain == intent.dest_chain {
            return Err(SwapError::UnsupportedRoute {
                from: intent.source_chain,
                to: intent.dest_chain,
            });
        }
        for (chain, asset) in [
            (intent.source_chain, &intent.source_asset),
            (intent.dest_chain, &intent.dest_asset),
        ] {
            if !self.config.supports_asset(chain, asset) {
                return Err(SwapError::UnsupportedAsset {
                    chain,
                    asset: asset.clone(),
                });
            }
        }

        let bounds = &self.config.coordinator;
        for (label, amount) in [
            ("source_amount", &intent.source_amount),
            ("dest_amount", &intent.dest_amount),
        ] {
            if amount.is_sign_negative() || amount.is_zero() {
                return Err(SwapError::InvalidAmount(format!(
                    "{} must be positive",
                    label
                )));
            }
            if *amount < bounds.min_amount || *amount > bounds.max_amount {
                return Err(SwapError::InvalidAmount(format!(
                    "{} {} outside configured bounds [{}, {}]",
                    label, amount, bounds.min_amount, bounds.max_amount
                )));
            }
        }
        // EVM amounts must be exactly representable in base units;
        // silent rounding at lock time would be a fund-loss bug.
        for (chain, asset, amount) in [
            (intent.source_chain, &intent.source_asset, &intent.source_amount),
            (intent.dest_chain, &intent.dest_asset, &intent.dest_amount),
        ] {
            if chain == ChainId::Evm {
                let decimals = self.config.evm_asset_decimals(asset).unwrap_or(18);
                to_base_units(amount, decimals)
                    .map_err(|e| SwapError::InvalidAmount(e.to_string()))?;
            }
        }

        for (chain, address) in [
            (intent.source_chain, &intent.source_address),
            (intent.dest_chain, &intent.dest_address),
        ] {
            validate_address(chain, address).map_err(|_| SwapError::InvalidAddress {
                chain,
                address: address.clone(),
            })?;
        }

        let now = self.clock.unix_now();
        let source_timelock = intent
            .timelock
            .unwrap_or(now + bounds.default_timelock_secs);
        validate_timelock(
            source_timelock,
            bounds.min_timelock_secs,
            bounds.max_timelock_secs,
            now,
        )?;
        let dest_timelock = derive_dest_timelock(source_timelock, now);

        let (preimage, hashlock) = match intent.hashlock {
            // Externally-committed hashlock: the preimage stays unknown
            // until it is revealed on-chain.
            Some(hashlock) => (None, hashlock),
            None => {
                let preimage = Preimage::generate();
                let hashlock = compute_hashlock(&preimage);
                (Some(preimage), hashlock)
            }
        };

        let contract_id = generate_contract_id(
            &intent.source_address,
            &intent.dest_address,
            &intent.source_amount,
            &hashlock,
            source_timelock,
        );

        let swap = Swap {
            swap_id: intent
                .swap_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            source_chain: intent.source_chain,
            dest_chain: intent.dest_chain,
            source_asset: intent.source_asset,
            dest_asset: intent.dest_asset,
            source_amount: intent.source_amount,
            dest_amount: intent.dest_amount,
            source_address: intent.source_address,
            dest_address: intent.dest_address,
            contract_id,
            hashlock,
            preimage,
            source_timelock,
            dest_timelock,
            status: SwapStatus::Created,
            source_tx_ref: None,
            dest_tx_ref: None,
            withdraw_tx_refs: Vec::new(),
            refund_tx_refs: Vec::new(),
            created_at: now,
            expires_at: source_timelock,
        };

        self.registry.put(swap.clone()).await?;
        info!(
            swap_id = %swap.swap_id,
            contract_id = %swap.contract_id,
            hashlock = %swap.hashlock,
            route = %format!("{}->{}", swap.source_chain, swap.dest_chain),
            "Swap initiated"
        );
        Ok(swap)
    }

    // ========================================================================
    // LOCK PHASE
    // ========================================================================

    /// Locks the source side. Transitions `created -> source_locked`.
    /// Idempotent for an already-locked swap.
    pub async fn create_source_htlc(&self, swap_id: &str) -> Result<String, SwapError> {
        let swap = self.registry.get(swap_id).await?;
        match swap.status {
            SwapStatus::Created => {}
            SwapStatus::SourceLocked => {
                // Idempotent retry: return the stored reference instead
                // of re-locking.
                return swap
                    .source_tx_ref
                    .clone()
                    .ok_or_else(|| SwapError::Internal("source_locked without tx ref".into()));
            }
            actual => {
                return Err(SwapError::InvalidState {
                    expected: SwapStatus::Created,
                    actual,
                })
            }
        }

        match self
            .registry
            .claim(swap_id, SwapStatus::Created, OpKind::LockSource)
            .await
        {
            Ok(()) => {}
            Err(SwapError::StaleState { .. }) => {
                // Lost the race; the winner's reference becomes ours.
                return self
                    .await_stored(swap_id, SwapStatus::Created, |s| s.source_tx_ref.clone())
                    .await;
            }
            Err(e) => return Err(e),
        }

        let params = LockParams {
            contract_id: swap.contract_id,
            counterparty: self.operator_addr(swap.source_chain).to_string(),
            asset: swap.source_asset.clone(),
            amount: swap.source_amount,
            hashlock: swap.hashlock,
            timelock: swap.source_timelock,
        };
        let adapter = self.adapter(swap.source_chain);
        let result = self.with_deadline(adapter.lock(&params)).await;

        match result {
            Ok(tx_ref) => {
                // Store the reference before dropping the claim so a
                // racing caller always finds one or the other.
                let stored = self
                    .registry
                    .update_guarded(swap_id, SwapStatus::Created, |s| {
                        s.status = SwapStatus::SourceLocked;
                        s.source_tx_ref = Some(tx_ref.clone());
                    })
                    .await;
                self.registry.release(swap_id, OpKind::LockSource).await;
                stored?;
                info!(swap_id, tx_ref = %tx_ref, "Source HTLC locked");
                Ok(tx_ref)
            }
            Err(e) => {
                self.registry.release(swap_id, OpKind::LockSource).await;
                warn!(swap_id, error = %e, "Source lock failed");
                Err(SwapError::Ledger(e))
            }
        }
    }

    /// Locks the destination side under the same contract id and
    /// hashlock. Requires the source lock to be confirmed on-ledger,
    /// not merely recorded locally.
    pub async fn create_destination_htlc(&self, swap_id: &str) -> Result<String, SwapError> {
        let swap = self.registry.get(swap_id).await?;
        match swap.status {
            SwapStatus::SourceLocked => {}
            SwapStatus::DestLocked => {
                return swap
                    .dest_tx_ref
                    .clone()
                    .ok_or_else(|| SwapError::Internal("dest_locked without tx ref".into()));
            }
            actual => {
                return Err(SwapError::InvalidState {
                    expected: SwapStatus::SourceLocked,
                    actual,
                })
            }
        }

        // Confirmation gate: local state can be optimistic while the
        // chain reorgs, so only the source ledger's own record counts.
        let source_record = self
            .with_deadline(self.adapter(swap.source_chain).read(&swap.contract_id))
            .await
            .map_err(SwapError::Ledger)?;
        if source_record.hashlock != swap.hashlock {
            return Err(SwapError::Internal(format!(
                "source ledger hashlock mismatch for swap {}",
                swap_id
            )));
        }

        match self
            .registry
            .claim(swap_id, SwapStatus::SourceLocked, OpKind::LockDest)
            .await
        {
            Ok(()) => {}
            Err(SwapError::StaleState { .. }) => {
                return self
                    .await_stored(swap_id, SwapStatus::SourceLocked, |s| s.dest_tx_ref.clone())
                    .await;
            }
            Err(e) => return Err(e),
        }

        let params = LockParams {
            contract_id: swap.contract_id,
            counterparty: swap.dest_address.clone(),
            asset: swap.dest_asset.clone(),
            amount: swap.dest_amount,
            hashlock: swap.hashlock,
            timelock: swap.dest_timelock,
        };
        let adapter = self.adapter(swap.dest_chain);
        let result = self.with_deadline(adapter.lock(&params)).await;

        match result {
            Ok(tx_ref) => {
                // Same ordering as the source path: reference first,
                // claim release second.
                let stored = self
                    .registry
                    .update_guarded(swap_id, SwapStatus::SourceLocked, |s| {
                        s.status = SwapStatus::DestLocked;
                        s.dest_tx_ref = Some(tx_ref.clone());
                    })
                    .await;
                self.registry.release(swap_id, OpKind::LockDest).await;
                stored?;
                info!(swap_id, tx_ref = %tx_ref, "Destination HTLC locked");
                Ok(tx_ref)
            }
            Err(e) => {
                self.registry.release(swap_id, OpKind::LockDest).await;
                warn!(swap_id, error = %e, "Destination lock failed");
                Err(SwapError::Ledger(e))
            }
        }
    }

    // ========================================================================
    // SETTLEMENT
    // ========================================================================

    /// Reveals the preimage on the destination side, then propagates it
    /// to the source side. Transitions to `completed` only once both
    /// withdrawals are confirmed on their ledgers.
    ///
    /// `claimed_preimage` is a client assertion and is only trusted
    /// after the destination ledger corroborates it.
    pub async fn complete_swap(
        &self,
        swap_id: &str,
        claimed_preimage: Option<Preimage>,
    ) -> Result<(String, String), SwapError> {
        let swap = self.registry.get(swap_id).await?;
        let guard = match swap.status {
            SwapStatus::DestLocked | SwapStatus::Revealed => swap.status,
            SwapStatus::Completed => {
                let source = swap.withdraw_ref(swap.source_chain).cloned();
                let dest = swap.withdraw_ref(swap.dest_chain).cloned();
                return match (source, dest) {
                    (Some(s), Some(d)) => Ok((s, d)),
                    _ => Err(SwapError::Internal(
                        "completed swap missing withdraw refs".into(),
                    )),
                };
            }
            actual => {
                return Err(SwapError::InvalidState {
                    expected: SwapStatus::DestLocked,
                    actual,
                })
            }
        };

        let preimage = self.resolve_preimage(&swap, claimed_preimage).await?;

        self.registry.claim(swap_id, guard, OpKind::Withdraw).await?;
        let result = self.settle(&swap, guard, preimage).await;
        self.registry.release(swap_id, OpKind::Withdraw).await;
        result
    }

    /// Determines the trustworthy preimage for settlement.
    async fn resolve_preimage(
        &self,
        swap: &Swap,
        claimed: Option<Preimage>,
    ) -> Result<Preimage, SwapError> {
        if let Some(preimage) = swap.preimage {
            return Ok(preimage);
        }
        // Coordinator never generated the preimage (external hashlock):
        // only on-chain state can supply it.
        let record = self
            .with_deadline(self.adapter(swap.dest_chain).read(&swap.contract_id))
            .await
            .map_err(SwapError::Ledger)?;
        if record.withdrawn {
            if let Some(preimage) = record.preimage {
                return Ok(preimage);
            }
        }
        match claimed {
            Some(candidate) if record.withdrawn && compute_hashlock(&candidate) == swap.hashlock => {
                Ok(candidate)
            }
            Some(_) => Err(SwapError::Ledger(LedgerError::InvalidPreimage)),
            None => Err(SwapError::InvalidState {
                expected: SwapStatus::Revealed,
                actual: swap.status,
            }),
        }
    }

    /// Withdraws destination, then source, then confirms both.
    async fn settle(
        &self,
        swap: &Swap,
        mut guard: SwapStatus,
        preimage: Preimage,
    ) -> Result<(String, String), SwapError> {
        let swap_id = swap.swap_id.as_str();

        // Destination withdrawal reveals the preimage on-chain.
        let dest_ref = match swap.withdraw_ref(swap.dest_chain) {
            Some(existing) => existing.clone(),
            None => {
                let adapter = self.adapter(swap.dest_chain);
                let tx_ref = match self
                    .with_deadline(adapter.withdraw(&swap.contract_id, &preimage))
                    .await
                {
                    Ok(tx_ref) => tx_ref,
                    // Counterparty (or a previous attempt) already
                    // revealed on-chain; carry on with propagation.
                    Err(LedgerError::AlreadyWithdrawn) => {
                        format!("external:{}", swap.contract_id.to_hex())
                    }
                    Err(e) => {
                        warn!(swap_id, error = %e, "Destination withdrawal failed");
                        return Err(SwapError::Ledger(e));
                    }
                };
                let dest_chain = swap.dest_chain;
                let tx_for_update = tx_ref.clone();
                self.registry
                    .update_guarded(swap_id, guard, move |s| {
                        s.status = SwapStatus::Revealed;
                        s.preimage = Some(preimage);
                        s.withdraw_tx_refs.push((dest_chain, tx_for_update));
                    })
                    .await?;
                guard = SwapStatus::Revealed;
                info!(swap_id, tx_ref = %tx_ref, "Preimage revealed on destination");
                tx_ref
            }
        };

        // Propagate the same preimage to the source side.
        let source_ref = match swap.withdraw_ref(swap.source_chain) {
            Some(existing) => existing.clone(),
            None => {
                let adapter = self.adapter(swap.source_chain);
                let tx_ref = match self
                    .with_deadline(adapter.withdraw(&swap.contract_id, &preimage))
                    .await
                {
                    Ok(tx_ref) => tx_ref,
                    Err(LedgerError::AlreadyWithdrawn) => {
                        format!("external:{}", swap.contract_id.to_hex())
                    }
                    Err(e) => {
                        // Partial success: stays revealed, the poller
                        // retries this side.
                        warn!(swap_id, error = %e, "Source withdrawal failed, swap stays revealed");
                        return Err(SwapError::Ledger(e));
                    }
                };
                let source_chain = swap.source_chain;
                let tx_for_update = tx_ref.clone();
                self.registry
                    .update_guarded(swap_id, guard, move |s| {
                        s.withdraw_tx_refs.push((source_chain, tx_for_update));
                    })
                    .await?;
                tx_ref
            }
        };

        // Completed only once both ledgers confirm the withdrawals.
        for chain in [swap.source_chain, swap.dest_chain] {
            let record = self
                .with_deadline(self.adapter(chain).read(&swap.contract_id))
                .await
                .map_err(SwapError::Ledger)?;
            if !record.withdrawn {
                warn!(swap_id, chain = %chain, "Withdrawal not yet confirmed, swap stays revealed");
                return Err(SwapError::Ledger(LedgerError::Unreachable(format!(
                    "withdrawal on {} not yet confirmed",
                    chain
                ))));
            }
        }

        self.registry
            .update_status(swap_id, SwapStatus::Completed, SwapStatus::Revealed)
            .await?;
        info!(swap_id, "Swap completed");
        Ok((source_ref, dest_ref))
    }

    // ========================================================================
    // REFUND PATH
    // ========================================================================

    /// Refunds whichever sides remain locked once their timelocks have
    /// elapsed. Transitions through `refunding` to `refunded`.
    pub async fn refund_swap(&self, swap_id: &str) -> Result<String, SwapError> {
        let swap = self.registry.get(swap_id).await?;
        let guard = match swap.status {
            SwapStatus::SourceLocked | SwapStatus::DestLocked | SwapStatus::Refunding => {
                swap.status
            }
            SwapStatus::Refunded => {
                return swap
                    .refund_tx_refs
                    .last()
                    .map(|(_, r)| r.clone())
                    .ok_or_else(|| SwapError::Internal("refunded swap missing refund refs".into()));
            }
            actual => {
                return Err(SwapError::InvalidState {
                    expected: SwapStatus::SourceLocked,
                    actual,
                })
            }
        };

        self.registry.claim(swap_id, guard, OpKind::Refund).await?;
        let result = self.refund_locked_sides(&swap, guard).await;
        self.registry.release(swap_id, OpKind::Refund).await;
        result
    }

    /// Walks the locked sides (destination first, its timelock is
    /// shorter) and refunds the eligible ones.
    async fn refund_locked_sides(
        &self,
        swap: &Swap,
        guard: SwapStatus,
    ) -> Result<String, SwapError> {
        let swap_id = swap.swap_id.as_str();
        let now = self.clock.unix_now();

        let mut sides: Vec<(ChainId, bool)> = Vec::new();
        if swap.dest_tx_ref.is_some() {
            sides.push((swap.dest_chain, swap.refund_ref(swap.dest_chain).is_some()));
        }
        if swap.source_tx_ref.is_some() {
            sides.push((
                swap.source_chain,
                swap.refund_ref(swap.source_chain).is_some(),
            ));
        }
        if sides.is_empty() {
            return Err(SwapError::InvalidState {
                expected: SwapStatus::SourceLocked,
                actual: swap.status,
            });
        }

        let mut last_ref: Option<String> = None;
        let mut pending_side = false;

        for (chain, already_refunded) in sides {
            if already_refunded {
                continue;
            }
            let record = self
                .with_deadline(self.adapter(chain).read(&swap.contract_id))
                .await
                .map_err(SwapError::Ledger)?;

            if record.withdrawn {
                // Refund race lost: the counterparty revealed and
                // claimed. The poller reclassifies toward completed.
                warn!(swap_id, chain = %chain, "Refund race lost to withdrawal");
                return Err(SwapError::Ledger(LedgerError::AlreadyWithdrawn));
            }
            if record.refunded {
                // Externally refunded; record it without a new tx.
                let external = format!("external:{}", swap.contract_id.to_hex());
                self.registry
                    .force_update(swap_id, |s| s.refund_tx_refs.push((chain, external.clone())))
                    .await?;
                last_ref = Some(external);
                continue;
            }
            if now < record.timelock {
                pending_side = true;
                continue;
            }

            let tx_ref = self
                .with_deadline(self.adapter(chain).refund(&swap.contract_id))
                .await
                .map_err(SwapError::Ledger)?;
            self.registry
                .force_update(swap_id, |s| s.refund_tx_refs.push((chain, tx_ref.clone())))
                .await?;
            info!(swap_id, chain = %chain, tx_ref = %tx_ref, "Side refunded");
            last_ref = Some(tx_ref);
        }

        match (last_ref, pending_side) {
            (Some(tx_ref), true) => {
                // One side refunded, another still under a later
                // timelock: park in refunding.
                if guard != SwapStatus::Refunding {
                    self.registry
                        .update_status(swap_id, SwapStatus::Refunding, guard)
                        .await?;
                }
                Ok(tx_ref)
            }
            (Some(tx_ref), false) => {
                if guard != SwapStatus::Refunding {
                    self.registry
                        .update_status(swap_id, SwapStatus::Refunding, guard)
                        .await?;
                }
                self.registry
                    .update_status(swap_id, SwapStatus::Refunded, SwapStatus::Refunding)
                    .await?;
                info!(swap_id, "Swap refunded");
                Ok(tx_ref)
            }
            (None, _) => Err(SwapError::Ledger(LedgerError::TimelockNotExpired)),
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Returns the swap by id.
    pub async fn get_swap(&self, swap_id: &str) -> Result<Swap, SwapError> {
        self.registry.get(swap_id).await
    }

    /// Returns all swaps passing the filter.
    pub async fn list_swaps(&self, filter: &SwapFilter) -> Vec<Swap> {
        self.registry.list(filter).await
    }

    /// Probes the coordinator's adapters.
    pub async fn health(&self) -> HealthReport {
        let mut adapter_statuses = Vec::new();
        for adapter in [&self.evm, &self.stellar] {
            let status = match self.with_deadline(adapter.health_check()).await {
                Ok(()) => "ok".to_string(),
                Err(e) => {
                    error!(chain = %adapter.chain(), error = %e, "Adapter health check failed");
                    e.to_string()
                }
            };
            adapter_statuses.push(AdapterHealth {
                chain: adapter.chain(),
                status,
            });
        }
        HealthReport {
            coordinator_status: "ok".to_string(),
            adapter_statuses,
        }
    }

    /// Marks a swap failed with full context. Used by reconciliation
    /// for swaps that can never make progress.
    pub async fn mark_failed(&self, swap_id: &str, reason: &str) {
        error!(swap_id, reason, "Marking swap failed");
        if let Err(e) = self
            .registry
            .force_update(swap_id, |s| s.status = SwapStatus::Failed)
            .await
        {
            error!(swap_id, error = %e, "Could not mark swap failed");
        }
    }
}

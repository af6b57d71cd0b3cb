//! Reconciliation Poller Module
//!
//! The poller is the coordinator's safety net: on a fixed interval it
//! reads authoritative ledger state for every non-terminal swap and
//! reconciles the registry with what actually happened on-chain. It
//! self-heals swaps whose driving client crashed mid-protocol (an
//! observed withdrawal propagates the revealed preimage to the other
//! side), records externally observed refunds, and starts the refund
//! path once timelocks expire.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::coordinator::SwapCoordinator;
use crate::error::{LedgerError, SwapError};
use crate::ledger::ContractRecord;
use crate::swap::{ChainId, Swap, SwapStatus};

/// Periodic registry-vs-ledger reconciliation.
pub struct ReconciliationPoller {
    coordinator: Arc<SwapCoordinator>,
    interval: Duration,
}

impl ReconciliationPoller {
    /// Creates a poller over the coordinator's registry and adapters.
    pub fn new(coordinator: Arc<SwapCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Runs the reconciliation loop until the task is cancelled.
    pub async fn run(&self) {
        info!(interval_ms = self.interval.as_millis() as u64, "Starting reconciliation poller");
        loop {
            self.reconcile_all().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One reconciliation pass over every non-terminal swap.
    pub async fn reconcile_all(&self) {
        let swaps = self.coordinator.registry().non_terminal().await;
        for swap in swaps {
            if let Err(e) = self.reconcile_swap(&swap).await {
                if matches!(e, SwapError::Ledger(ref le) if le.is_retryable()) {
                    // Transport failure; the next tick retries.
                    warn!(swap_id = %swap.swap_id, error = %e, "Reconciliation deferred");
                } else {
                    error!(
                        swap_id = %swap.swap_id,
                        status = %swap.status,
                        error = %e,
                        "Reconciliation error"
                    );
                }
            }
        }
    }

    /// Reads both ledgers for one swap and applies the reconciliation
    /// rules.
    async fn reconcile_swap(&self, swap: &Swap) -> Result<(), SwapError> {
        let source = self.read_side(swap, swap.source_chain).await?;
        let dest = self.read_side(swap, swap.dest_chain).await?;

        let withdrawn = |r: &Option<ContractRecord>| r.as_ref().map_or(false, |r| r.withdrawn);
        let refunded = |r: &Option<ContractRecord>| r.as_ref().map_or(false, |r| r.refunded);

        // A withdrawal on one side with a refund on the other means one
        // party gained while the other lost; that must never resolve
        // silently.
        if (withdrawn(&source) && refunded(&dest)) || (withdrawn(&dest) && refunded(&source)) {
            self.coordinator
                .mark_failed(
                    &swap.swap_id,
                    "inconsistent ledger state: one side withdrawn, the other refunded",
                )
                .await;
            return Ok(());
        }

        if withdrawn(&source) || withdrawn(&dest) {
            return self.heal_withdrawal(swap, source, dest).await;
        }
        if refunded(&source) || refunded(&dest) {
            return self.record_external_refunds(swap, source, dest).await;
        }

        // A swap abandoned before any lock has nothing to refund; once
        // its window has passed it can never make progress, so retire it
        // from the work set.
        if swap.status == SwapStatus::Created
            && source.is_none()
            && dest.is_none()
            && self.coordinator.unix_now() >= swap.expires_at
        {
            self.coordinator
                .mark_failed(&swap.swap_id, "expired before any lock was created")
                .await;
            return Ok(());
        }

        self.maybe_start_refund(swap).await
    }

    /// Reads one chain side; a missing contract is not an error here
    /// (the lock may not have been created or confirmed yet).
    async fn read_side(
        &self,
        swap: &Swap,
        chain: ChainId,
    ) -> Result<Option<ContractRecord>, SwapError> {
        match self
            .coordinator
            .with_deadline(self.coordinator.adapter(chain).read(&swap.contract_id))
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(LedgerError::NotFound) => Ok(None),
            Err(e) => Err(SwapError::Ledger(e)),
        }
    }

    /// An observed withdrawal is authoritative reveal: capture the
    /// on-chain preimage and drive the other side's withdrawal.
    async fn heal_withdrawal(
        &self,
        swap: &Swap,
        source: Option<ContractRecord>,
        dest: Option<ContractRecord>,
    ) -> Result<(), SwapError> {
        let registry = self.coordinator.registry();
        let swap_id = swap.swap_id.as_str();

        let preimage = [&source, &dest]
            .into_iter()
            .flatten()
            .filter(|r| r.withdrawn)
            .find_map(|r| r.preimage)
            .or(swap.preimage)
            .ok_or_else(|| {
                SwapError::Internal(format!(
                    "withdrawal observed for swap {} but no preimage recoverable",
                    swap_id
                ))
            })?;

        // Record externally observed withdrawals and the preimage.
        let external = format!("external:{}", swap.contract_id.to_hex());
        for (chain, record) in [(swap.source_chain, &source), (swap.dest_chain, &dest)] {
            let observed = record.as_ref().map_or(false, |r| r.withdrawn);
            if observed && swap.withdraw_ref(chain).is_none() {
                let reference = external.clone();
                registry
                    .force_update(swap_id, |s| {
                        s.preimage = Some(preimage);
                        if s.status != SwapStatus::Revealed {
                            s.status = SwapStatus::Revealed;
                        }
                        s.withdraw_tx_refs.push((chain, reference));
                    })
                    .await?;
                info!(swap_id, chain = %chain, "Observed external withdrawal");
            }
        }

        // Drive the side that is still locked.
        for (chain, record) in [(swap.source_chain, &source), (swap.dest_chain, &dest)] {
            if let Some(record) = record {
                if !record.withdrawn && !record.refunded {
                    let adapter = self.coordinator.adapter(chain);
                    let tx_ref = self
                        .coordinator
                        .with_deadline(adapter.withdraw(&swap.contract_id, &preimage))
                        .await
                        .map_err(SwapError::Ledger)?;
                    registry
                        .force_update(swap_id, |s| {
                            s.preimage = Some(preimage);
                            if s.status != SwapStatus::Revealed {
                                s.status = SwapStatus::Revealed;
                            }
                            s.withdraw_tx_refs.push((chain, tx_ref.clone()));
                        })
                        .await?;
                    info!(swap_id, chain = %chain, tx_ref = %tx_ref, "Propagated withdrawal");
                }
            }
        }

        // Confirm both sides before declaring completion.
        let source_done = self
            .read_side(swap, swap.source_chain)
            .await?
            .map_or(false, |r| r.withdrawn);
        let dest_done = self
            .read_side(swap, swap.dest_chain)
            .await?
            .map_or(false, |r| r.withdrawn);
        if source_done && dest_done {
            registry
                .force_update(swap_id, |s| s.status = SwapStatus::Completed)
                .await?;
            info!(swap_id, "Swap completed by reconciliation");
        }
        Ok(())
    }

    /// Records refunds performed outside the coordinator and settles
    /// the terminal status once no locked side remains.
    async fn record_external_refunds(
        &self,
        swap: &Swap,
        source: Option<ContractRecord>,
        dest: Option<ContractRecord>,
    ) -> Result<(), SwapError> {
        let registry = self.coordinator.registry();
        let swap_id = swap.swap_id.as_str();
        let external = format!("external:{}", swap.contract_id.to_hex());

        let mut still_locked = false;
        for (chain, record) in [(swap.source_chain, &source), (swap.dest_chain, &dest)] {
            match record {
                Some(r) if r.refunded => {
                    if swap.refund_ref(chain).is_none() {
                        let reference = external.clone();
                        registry
                            .force_update(swap_id, |s| s.refund_tx_refs.push((chain, reference)))
                            .await?;
                        info!(swap_id, chain = %chain, "Observed external refund");
                    }
                }
                Some(_) => still_locked = true,
                None => {}
            }
        }

        let new_status = if still_locked {
            SwapStatus::Refunding
        } else {
            SwapStatus::Refunded
        };
        if swap.status != new_status {
            registry
                .force_update(swap_id, |s| s.status = new_status)
                .await?;
            info!(swap_id, status = %new_status, "Refund status reconciled");
        }

        // A refund on one side commits the swap to aborting; drive the
        // still-locked side as soon as its own timelock allows.
        if still_locked {
            return self.maybe_start_refund(swap).await;
        }
        Ok(())
    }

    /// Starts the refund path for swaps whose relevant timelock has
    /// expired without a reveal.
    async fn maybe_start_refund(&self, swap: &Swap) -> Result<(), SwapError> {
        let eligible = matches!(
            swap.status,
            SwapStatus::SourceLocked | SwapStatus::DestLocked | SwapStatus::Refunding
        );
        if !eligible {
            return Ok(());
        }

        match self.coordinator.refund_swap(&swap.swap_id).await {
            Ok(tx_ref) => {
                info!(swap_id = %swap.swap_id, tx_ref = %tx_ref, "Refund driven by reconciliation");
                Ok(())
            }
            // Not yet expired, or another operation holds the claim;
            // both are normal and resolve on a later tick.
            Err(SwapError::Ledger(LedgerError::TimelockNotExpired))
            | Err(SwapError::StaleState { .. }) => {
                debug!(swap_id = %swap.swap_id, "Refund not yet due");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

//! In-Memory Ledger Adapter
//!
//! A fully functional in-memory ledger used by the test suite and for
//! local development without chain nodes. It enforces the same HTLC
//! semantics as the real ledgers (hashlock check on withdraw, timelock
//! check on refund, terminal exclusivity), counts adapter calls, and
//! supports failure injection and artificial latency so concurrency
//! behavior can be exercised deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ContractRecord, LedgerAdapter, LockParams};
use crate::clock::Clock;
use crate::error::LedgerError;
use crate::htlc::{compute_hashlock, ContractId, Preimage};
use crate::swap::ChainId;

/// In-memory HTLC ledger with real contract semantics.
pub struct MockLedgerAdapter {
    chain: ChainId,
    clock: Arc<dyn Clock>,
    contracts: Mutex<HashMap<ContractId, ContractRecord>>,
    tx_counter: AtomicUsize,
    lock_calls: AtomicUsize,
    withdraw_calls: AtomicUsize,
    refund_calls: AtomicUsize,
    fail_next_lock: Mutex<Option<LedgerError>>,
    fail_next_withdraw: Mutex<Option<LedgerError>>,
    lock_delay: Mutex<Option<Duration>>,
}

impl MockLedgerAdapter {
    /// Creates an empty mock ledger for the given chain.
    pub fn new(chain: ChainId, clock: Arc<dyn Clock>) -> Self {
        Self {
            chain,
            clock,
            contracts: Mutex::new(HashMap::new()),
            tx_counter: AtomicUsize::new(0),
            lock_calls: AtomicUsize::new(0),
            withdraw_calls: AtomicUsize::new(0),
            refund_calls: AtomicUsize::new(0),
            fail_next_lock: Mutex::new(None),
            fail_next_withdraw: Mutex::new(None),
            lock_delay: Mutex::new(None),
        }
    }

    fn next_tx_ref(&self, op: &str) -> String {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}-tx-{}", self.chain, op, n)
    }
}

// Test seams. Not part of the adapter surface; only the test suite
// calls these.
#[doc(hidden)]
#[allow(dead_code)]
impl MockLedgerAdapter {
    /// Number of `lock` calls that reached this ledger.
    pub fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::SeqCst)
    }

    /// Number of `withdraw` calls that reached this ledger.
    pub fn withdraw_calls(&self) -> usize {
        self.withdraw_calls.load(Ordering::SeqCst)
    }

    /// Number of `refund` calls that reached this ledger.
    pub fn refund_calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }

    /// Makes the next `lock` call fail with the given error.
    pub async fn fail_next_lock(&self, error: LedgerError) {
        *self.fail_next_lock.lock().await = Some(error);
    }

    /// Makes the next `withdraw` call fail with the given error.
    pub async fn fail_next_withdraw(&self, error: LedgerError) {
        *self.fail_next_withdraw.lock().await = Some(error);
    }

    /// Adds artificial latency to `lock` calls (for race tests).
    pub async fn set_lock_delay(&self, delay: Duration) {
        *self.lock_delay.lock().await = Some(delay);
    }

    /// Simulates an external party claiming the contract on-chain with
    /// the preimage, without going through the coordinator.
    pub async fn force_withdraw(
        &self,
        contract_id: &ContractId,
        preimage: &Preimage,
    ) -> Result<(), LedgerError> {
        let mut contracts = self.contracts.lock().await;
        let record = contracts.get_mut(contract_id).ok_or(LedgerError::NotFound)?;
        if record.withdrawn {
            return Err(LedgerError::AlreadyWithdrawn);
        }
        if record.refunded {
            return Err(LedgerError::AlreadyRefunded);
        }
        if record.hashlock != *preimage {
            return Err(LedgerError::InvalidPreimage);
        }
        record.withdrawn = true;
        record.preimage = Some(*preimage);
        Ok(())
    }

    /// Returns a copy of the stored contract record, if any.
    pub async fn contract(&self, contract_id: &ContractId) -> Option<ContractRecord> {
        self.contracts.lock().await.get(contract_id).cloned()
    }
}

#[async_trait]
impl LedgerAdapter for MockLedgerAdapter {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn lock(&self, params: &LockParams) -> Result<String, LedgerError> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = *self.lock_delay.lock().await {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.fail_next_lock.lock().await.take() {
            return Err(error);
        }

        let mut contracts = self.contracts.lock().await;
        if contracts.contains_key(&params.contract_id) {
            return Err(LedgerError::Reverted(
                "contract id already exists".to_string(),
            ));
        }
        contracts.insert(
            params.contract_id,
            ContractRecord {
                initiator: format!("{}-initiator", self.chain),
                participant: params.counterparty.clone(),
                asset: params.asset.clone(),
                amount: params.amount,
                hashlock: params.hashlock,
                timelock: params.timelock,
                withdrawn: false,
                refunded: false,
                preimage: None,
                created_at: self.clock.unix_now(),
            },
        );
        Ok(self.next_tx_ref("lock"))
    }

    async fn withdraw(
        &self,
        contract_id: &ContractId,
        preimage: &Preimage,
    ) -> Result<String, LedgerError> {
        self.withdraw_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.fail_next_withdraw.lock().await.take() {
            return Err(error);
        }

        let mut contracts = self.contracts.lock().await;
        let record = contracts.get_mut(contract_id).ok_or(LedgerError::NotFound)?;
        if record.withdrawn {
            return Err(LedgerError::AlreadyWithdrawn);
        }
        if record.refunded {
            return Err(LedgerError::AlreadyRefunded);
        }
        if compute_hashlock(preimage) != record.hashlock {
            return Err(LedgerError::InvalidPreimage);
        }
        record.withdrawn = true;
        record.preimage = Some(*preimage);
        Ok(self.next_tx_ref("withdraw"))
    }

    async fn refund(&self, contract_id: &ContractId) -> Result<String, LedgerError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);

        let mut contracts = self.contracts.lock().await;
        let record = contracts.get_mut(contract_id).ok_or(LedgerError::NotFound)?;
        if record.withdrawn {
            return Err(LedgerError::AlreadyWithdrawn);
        }
        if record.refunded {
            return Err(LedgerError::AlreadyRefunded);
        }
        if self.clock.unix_now() < record.timelock {
            return Err(LedgerError::TimelockNotExpired);
        }
        record.refunded = true;
        Ok(self.next_tx_ref("refund"))
    }

    async fn read(&self, contract_id: &ContractId) -> Result<ContractRecord, LedgerError> {
        self.contracts
            .lock()
            .await
            .get(contract_id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

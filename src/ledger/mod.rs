//! Ledger Adapter Module
//!
//! This module defines the uniform operation set the coordinator uses to
//! drive a chain-side HTLC, plus the concrete adapters. Each adapter owns
//! its chain-specific concerns (signing account, fee handling, address
//! encoding) and normalizes every outcome to the shared [`LedgerError`]
//! taxonomy so the coordinator never branches on chain type.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::htlc::{ContractId, Hashlock, Preimage};
use crate::swap::ChainId;

pub mod evm;
pub mod mock;
pub mod stellar;

pub use evm::EvmLedgerAdapter;
pub use mock::MockLedgerAdapter;
pub use stellar::StellarLedgerAdapter;

// ============================================================================
// ADAPTER DATA STRUCTURES
// ============================================================================

/// Parameters for creating a chain-side HTLC lock.
#[derive(Debug, Clone)]
pub struct LockParams {
    /// Contract id shared by both chain-side instances.
    pub contract_id: ContractId,
    /// Party entitled to claim with the preimage.
    pub counterparty: String,
    /// Asset identifier on this chain.
    pub asset: String,
    /// Amount to lock (arbitrary-precision decimal).
    pub amount: Decimal,
    /// Hash commitment the withdrawal preimage must match.
    pub hashlock: Hashlock,
    /// Absolute expiry after which the lock becomes refundable.
    pub timelock: u64,
}

/// On-chain HTLC state as read from a ledger.
///
/// `withdrawn` and `refunded` are mutually exclusive and monotonic: once
/// true, never false. After a withdrawal the ledger exposes the revealed
/// preimage, which reconciliation uses to drive the other side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Party that created the lock.
    pub initiator: String,
    /// Party entitled to claim with the preimage.
    pub participant: String,
    /// Asset identifier on this chain.
    pub asset: String,
    /// Locked amount.
    pub amount: Decimal,
    /// Hash commitment.
    pub hashlock: Hashlock,
    /// Absolute expiry (epoch seconds).
    pub timelock: u64,
    /// Whether the participant claimed the funds with the preimage.
    pub withdrawn: bool,
    /// Whether the initiator reclaimed the funds after expiry.
    pub refunded: bool,
    /// Preimage revealed by the withdrawal, when `withdrawn` is true.
    /// Deserialized from on-chain data; authoritative once present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde(with = "preimage_hex")]
    pub preimage: Option<Preimage>,
    /// Ledger-side creation time (epoch seconds).
    pub created_at: u64,
}

/// Serde helper for the optional on-chain preimage. The [`Preimage`]
/// type itself has no serde impls (it must never leave the coordinator),
/// but ledger payloads legitimately carry it once it is public on-chain.
mod preimage_hex {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::htlc::Preimage;

    pub fn serialize<S: Serializer>(
        value: &Option<Preimage>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(p) => serializer.serialize_some(&p.to_hex()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Preimage>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => Preimage::from_hex(&s).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

// ============================================================================
// ADAPTER TRAIT
// ============================================================================

/// Uniform operation set over a chain's HTLC contract/ledger.
///
/// `lock`, `withdraw`, and `refund` return once the chain accepts the
/// transaction as pending; they do not wait for finality. Confirmation
/// is the caller's responsibility via [`LedgerAdapter::read`].
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// The chain this adapter serves.
    fn chain(&self) -> ChainId;

    /// Submits the HTLC lock. Returns the lock transaction reference.
    async fn lock(&self, params: &LockParams) -> Result<String, LedgerError>;

    /// Submits reveal + claim with the preimage.
    async fn withdraw(
        &self,
        contract_id: &ContractId,
        preimage: &Preimage,
    ) -> Result<String, LedgerError>;

    /// Submits a refund of an expired lock back to its initiator.
    async fn refund(&self, contract_id: &ContractId) -> Result<String, LedgerError>;

    /// Reads the authoritative contract state.
    async fn read(&self, contract_id: &ContractId) -> Result<ContractRecord, LedgerError>;

    /// Lightweight liveness probe of the backing node/relay.
    async fn health_check(&self) -> Result<(), LedgerError>;
}

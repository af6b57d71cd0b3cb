//! Swap Data Model Module
//!
//! This module contains the swap intent/state structures shared across
//! the coordinator, registry, reconciliation poller, and API layers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::htlc::{ContractId, Hashlock, Preimage};

// ============================================================================
// CHAIN IDENTIFIERS
// ============================================================================

/// Supported ledgers.
///
/// The coordinator dispatches on chain identity exactly once, at the
/// adapter boundary; business logic never re-tests chain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    /// EVM-compatible chain hosting the on-chain HTLC contract.
    Evm,
    /// Stellar-side ledger (HTLC semantics enforced by a relay).
    Stellar,
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Evm => f.write_str("evm"),
            ChainId::Stellar => f.write_str("stellar"),
        }
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evm" => Ok(ChainId::Evm),
            "stellar" => Ok(ChainId::Stellar),
            other => Err(format!("unknown chain: {}", other)),
        }
    }
}

// ============================================================================
// SWAP STATUS
// ============================================================================

/// Lifecycle status of a swap.
///
/// Exactly one terminal status is reachable from `Created`; terminal
/// statuses are immutable and archived, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Registry entry exists; nothing locked on-chain yet.
    Created,
    /// Source-side HTLC lock accepted by the source ledger.
    SourceLocked,
    /// Destination-side HTLC lock accepted by the destination ledger.
    DestLocked,
    /// Preimage revealed; at least one withdrawal submitted, not yet
    /// confirmed on both sides.
    Revealed,
    /// Both withdrawals confirmed. Terminal.
    Completed,
    /// Refund submitted on at least one side; another side may still be
    /// locked under a later timelock.
    Refunding,
    /// All locked sides refunded. Terminal.
    Refunded,
    /// Unrecoverable error; operator intervention required. Terminal.
    Failed,
}

impl SwapStatus {
    /// Whether the status is terminal (immutable once reached).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Completed | SwapStatus::Refunded | SwapStatus::Failed
        )
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapStatus::Created => "created",
            SwapStatus::SourceLocked => "source_locked",
            SwapStatus::DestLocked => "dest_locked",
            SwapStatus::Revealed => "revealed",
            SwapStatus::Completed => "completed",
            SwapStatus::Refunding => "refunding",
            SwapStatus::Refunded => "refunded",
            SwapStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SWAP INTENT AND STATE
// ============================================================================

/// Client request to initiate a swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapIntent {
    /// Caller-supplied swap id; a UUID is generated when absent.
    #[serde(default)]
    pub swap_id: Option<String>,
    /// Chain funds move from.
    pub source_chain: ChainId,
    /// Chain funds move to.
    pub dest_chain: ChainId,
    /// Asset identifier on the source chain.
    pub source_asset: String,
    /// Asset identifier on the destination chain.
    pub dest_asset: String,
    /// Amount locked on the source chain (decimal string).
    pub source_amount: Decimal,
    /// Amount locked on the destination chain (decimal string).
    pub dest_amount: Decimal,
    /// Initiator address on the source chain.
    pub source_address: String,
    /// Counterparty address on the destination chain.
    pub dest_address: String,
    /// Optional source-side absolute expiry (epoch seconds); the
    /// configured default duration applies when absent.
    #[serde(default)]
    pub timelock: Option<u64>,
    /// Optional externally-supplied hashlock. When present the
    /// coordinator does not know the preimage until it is revealed
    /// on-chain.
    #[serde(default)]
    pub hashlock: Option<Hashlock>,
}

/// The atomic-swap intent and its evolving state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swap {
    /// Opaque unique identifier.
    pub swap_id: String,
    /// Chain funds move from.
    pub source_chain: ChainId,
    /// Chain funds move to.
    pub dest_chain: ChainId,
    /// Asset identifier on the source chain.
    pub source_asset: String,
    /// Asset identifier on the destination chain.
    pub dest_asset: String,
    /// Amount locked on the source chain.
    pub source_amount: Decimal,
    /// Amount locked on the destination chain.
    pub dest_amount: Decimal,
    /// Initiator address on the source chain.
    pub source_address: String,
    /// Counterparty address on the destination chain.
    pub dest_address: String,
    /// Derived commitment joining the two on-chain HTLC instances.
    pub contract_id: ContractId,
    /// Public hash commitment of the preimage.
    pub hashlock: Hashlock,
    /// Secret preimage. Held in process memory only: skipped on
    /// serialization so it is never persisted or transmitted. `None`
    /// until generated locally or recovered from on-chain withdrawal
    /// data.
    #[serde(skip)]
    pub preimage: Option<Preimage>,
    /// Source-side absolute lock expiry (epoch seconds).
    pub source_timelock: u64,
    /// Destination-side absolute lock expiry; always strictly earlier
    /// than `source_timelock`.
    pub dest_timelock: u64,
    /// Current lifecycle status.
    pub status: SwapStatus,
    /// Source-side lock transaction reference.
    pub source_tx_ref: Option<String>,
    /// Destination-side lock transaction reference.
    pub dest_tx_ref: Option<String>,
    /// Withdrawal transaction references, keyed by chain.
    pub withdraw_tx_refs: Vec<(ChainId, String)>,
    /// Refund transaction references, keyed by chain.
    pub refund_tx_refs: Vec<(ChainId, String)>,
    /// Creation time (epoch seconds).
    pub created_at: u64,
    /// Overall expiry: the later (source) timelock.
    pub expires_at: u64,
}

impl Swap {
    /// Looks up the stored withdrawal reference for a chain side.
    pub fn withdraw_ref(&self, chain: ChainId) -> Option<&String> {
        self.withdraw_tx_refs
            .iter()
            .find(|(c, _)| *c == chain)
            .map(|(_, r)| r)
    }

    /// Looks up the stored refund reference for a chain side.
    pub fn refund_ref(&self, chain: ChainId) -> Option<&String> {
        self.refund_tx_refs
            .iter()
            .find(|(c, _)| *c == chain)
            .map(|(_, r)| r)
    }
}

// ============================================================================
// LIST FILTER
// ============================================================================

/// Optional filters for listing swaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapFilter {
    /// Only swaps with this status.
    #[serde(default)]
    pub status: Option<SwapStatus>,
    /// Only swaps with this source chain.
    #[serde(default)]
    pub source_chain: Option<ChainId>,
    /// Only swaps with this destination chain.
    #[serde(default)]
    pub dest_chain: Option<ChainId>,
}

impl SwapFilter {
    /// Whether a swap passes all present filters.
    pub fn matches(&self, swap: &Swap) -> bool {
        self.status.map_or(true, |s| swap.status == s)
            && self.source_chain.map_or(true, |c| swap.source_chain == c)
            && self.dest_chain.map_or(true, |c| swap.dest_chain == c)
    }
}

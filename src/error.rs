//! Error Taxonomy Module
//!
//! This module defines the shared error types for the coordinator service.
//! Ledger adapters normalize every chain-specific failure into
//! [`LedgerError`] so the coordinator never branches on chain type, and
//! the coordinator surfaces [`SwapError`] to callers with a stable
//! machine-readable kind alongside the human-readable detail.

use thiserror::Error;

use crate::swap::{ChainId, SwapStatus};

// ============================================================================
// LEDGER ERRORS
// ============================================================================

/// Normalized failure modes for ledger adapter operations.
///
/// Each concrete adapter maps its chain-specific outcomes (revert reasons,
/// relay error kinds, transport failures) onto this taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger rejected the preimage against the stored hashlock.
    #[error("preimage does not match the contract hashlock")]
    InvalidPreimage,

    /// The contract funds were already claimed with a revealed preimage.
    #[error("contract already withdrawn")]
    AlreadyWithdrawn,

    /// The contract funds were already returned to the initiator.
    #[error("contract already refunded")]
    AlreadyRefunded,

    /// Refund was attempted before the contract timelock elapsed.
    #[error("timelock has not expired yet")]
    TimelockNotExpired,

    /// No contract with the given id exists on this ledger.
    #[error("contract not found on ledger")]
    NotFound,

    /// The sending account cannot cover the lock amount (plus fees).
    #[error("insufficient funds for lock")]
    InsufficientFunds,

    /// The ledger reverted the transaction for a reason outside the
    /// shared taxonomy; the raw reason is preserved for operators.
    #[error("ledger reverted transaction: {0}")]
    Reverted(String),

    /// The ledger node could not be reached or timed out. The true
    /// outcome of a submission is unknown; callers must not assume a
    /// no-op and should resolve via a later read.
    #[error("ledger unreachable: {0}")]
    Unreachable(String),
}

impl LedgerError {
    /// Whether the reconciliation poller should retry the operation
    /// automatically. Only transport-level failures qualify; contract
    /// state rejections are terminal for that operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unreachable(_))
    }
}

// ============================================================================
// SWAP ERRORS
// ============================================================================

/// Failure modes for coordinator operations.
///
/// Validation errors are rejected before any ledger interaction. State
/// errors indicate a protocol-sequencing mistake or lost race and are
/// recoverable by re-querying and retrying the correct next step. Ledger
/// errors carry the normalized underlying cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SwapError {
    /// The chain pair is not a supported swap route.
    #[error("unsupported route: {from} -> {to}")]
    UnsupportedRoute { from: ChainId, to: ChainId },

    /// The asset is not supported on the given chain.
    #[error("asset {asset} is not supported on {chain}")]
    UnsupportedAsset { chain: ChainId, asset: String },

    /// The amount is non-positive, out of configured bounds, or not
    /// representable in the asset's base units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The address is not well-formed for its chain.
    #[error("invalid address for {chain}: {address}")]
    InvalidAddress { chain: ChainId, address: String },

    /// The requested timelock falls outside the configured window.
    #[error("timelock out of bounds: expiry {candidate} not within [{min}, {max}] seconds from now")]
    TimelockOutOfBounds { candidate: u64, min: u64, max: u64 },

    /// No swap with the given id exists in the registry.
    #[error("swap not found: {0}")]
    SwapNotFound(String),

    /// The swap is not in a status that permits the requested operation.
    #[error("invalid state for operation: swap is {actual}, expected {expected}")]
    InvalidState {
        expected: SwapStatus,
        actual: SwapStatus,
    },

    /// A compare-and-swap guard did not match the stored status; a
    /// concurrent operation won the transition.
    #[error("stale state: guard {guard} does not match stored status {actual}")]
    StaleState {
        guard: SwapStatus,
        actual: SwapStatus,
    },

    /// A ledger operation failed; the underlying cause is preserved.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// An unrecoverable internal error; the swap requires operator
    /// intervention.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// Stable machine-readable error kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            SwapError::UnsupportedRoute { .. } => "unsupported_route",
            SwapError::UnsupportedAsset { .. } => "unsupported_asset",
            SwapError::InvalidAmount(_) => "invalid_amount",
            SwapError::InvalidAddress { .. } => "invalid_address",
            SwapError::TimelockOutOfBounds { .. } => "timelock_out_of_bounds",
            SwapError::SwapNotFound(_) => "swap_not_found",
            SwapError::InvalidState { .. } => "invalid_state",
            SwapError::StaleState { .. } => "stale_state",
            SwapError::Ledger(LedgerError::InvalidPreimage) => "invalid_preimage",
            SwapError::Ledger(LedgerError::AlreadyWithdrawn) => "already_withdrawn",
            SwapError::Ledger(LedgerError::AlreadyRefunded) => "already_refunded",
            SwapError::Ledger(LedgerError::TimelockNotExpired) => "timelock_not_expired",
            SwapError::Ledger(LedgerError::NotFound) => "contract_not_found",
            SwapError::Ledger(LedgerError::InsufficientFunds) => "insufficient_funds",
            SwapError::Ledger(LedgerError::Reverted(_)) => "ledger_reverted",
            SwapError::Ledger(LedgerError::Unreachable(_)) => "ledger_unreachable",
            SwapError::Internal(_) => "internal",
        }
    }

    /// Whether this is an input-validation failure (rejected before any
    /// ledger interaction).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SwapError::UnsupportedRoute { .. }
                | SwapError::UnsupportedAsset { .. }
                | SwapError::InvalidAmount(_)
                | SwapError::InvalidAddress { .. }
                | SwapError::TimelockOutOfBounds { .. }
        )
    }
}

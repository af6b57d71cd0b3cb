//! HTLC Swap Coordinator Library
//!
//! This crate provides a coordinator service that drives cross-chain atomic
//! swaps through hashed-timelock contracts (HTLCs) on an EVM chain and a
//! Stellar ledger. The coordinator orchestrates the lock/reveal/refund
//! protocol, tracks swap state in an in-memory registry, and reconciles
//! registry state against on-ledger contract state in the background.

pub mod api;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod htlc;
pub mod ledger;
pub mod reconcile;
pub mod registry;
pub mod swap;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::{ApiConfig, Config, CoordinatorConfig, EvmChainConfig, StellarChainConfig};
pub use coordinator::{HealthReport, SwapCoordinator};
pub use error::{LedgerError, SwapError};
pub use htlc::{ContractId, Hashlock, Preimage};
pub use ledger::{ContractRecord, LedgerAdapter, LockParams};
pub use registry::SwapRegistry;
pub use swap::{ChainId, Swap, SwapFilter, SwapIntent, SwapStatus};

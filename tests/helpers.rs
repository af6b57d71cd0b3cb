//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by unit tests.
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy addresses and timing values shared across tests
//! - **Manual Clock**: A deterministic, manually-advanced time source
//! - **Configuration Builders**: Functions to create test configurations
//! - **Harness Builders**: Functions wiring a coordinator to mock ledgers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;

use htlc_coordinator::clock::Clock;
use htlc_coordinator::config::{
    ApiConfig, Config, CoordinatorConfig, EvmAssetConfig, EvmChainConfig, StellarChainConfig,
};
use htlc_coordinator::coordinator::SwapCoordinator;
use htlc_coordinator::ledger::MockLedgerAdapter;
use htlc_coordinator::registry::SwapRegistry;
use htlc_coordinator::swap::{ChainId, SwapIntent};

// ============================================================================
// CONSTANTS
// ============================================================================

// -------------------------------- TIMING --------------------------------

/// Fixed test epoch so timelock math is reproducible
pub const DUMMY_NOW: u64 = 1_700_000_000;

/// Default source lock duration used by the test config (2 hours)
pub const DUMMY_TIMELOCK_SECS: u64 = 7_200;

// -------------------------------- USERS ---------------------------------

/// Dummy swap initiator address (EVM format, 20 bytes)
pub const DUMMY_INITIATOR_ADDR_EVM: &str = "0x1111111111111111111111111111111111111111";

/// Dummy swap counterparty address (EVM format, 20 bytes)
#[allow(dead_code)]
pub const DUMMY_COUNTERPARTY_ADDR_EVM: &str = "0x2222222222222222222222222222222222222222";

/// Dummy swap counterparty address (Stellar format, 56-character G key)
pub const DUMMY_COUNTERPARTY_ADDR_STELLAR: &str =
    "GDQP2KPQGKIHYJGXNUIYOMHARUARCA7DJT5FO2FFOOKY3B2WSQHG4W37";

/// Dummy coordinator operator address (Stellar format)
pub const DUMMY_OPERATOR_ADDR_STELLAR: &str =
    "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";

// ------------------------- TOKENS AND CONTRACTS -------------------------

/// Dummy deployed HTLC contract address (EVM format)
pub const DUMMY_HTLC_CONTRACT_ADDR: &str = "0x3333333333333333333333333333333333333333";

/// Dummy coordinator sender account (EVM format)
pub const DUMMY_SENDER_ADDR_EVM: &str = "0x4444444444444444444444444444444444444444";

/// Dummy USDC token address (EVM format)
pub const DUMMY_USDC_TOKEN_ADDR: &str = "0x5555555555555555555555555555555555555555";

// ============================================================================
// MANUAL CLOCK
// ============================================================================

/// Deterministic time source advanced explicitly by tests.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at the given epoch second.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute epoch second.
    #[allow(dead_code)]
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Create a complete test configuration with both chains and default
/// timelock/amount bounds.
pub fn build_test_config() -> Config {
    Config {
        evm_chain: EvmChainConfig {
            name: "evm-test".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            htlc_contract_addr: DUMMY_HTLC_CONTRACT_ADDR.to_string(),
            sender_addr: DUMMY_SENDER_ADDR_EVM.to_string(),
            assets: vec![
                EvmAssetConfig {
                    symbol: "ETH".to_string(),
                    token_addr: "0x0000000000000000000000000000000000000000".to_string(),
                    decimals: 18,
                },
                EvmAssetConfig {
                    symbol: "USDC".to_string(),
                    token_addr: DUMMY_USDC_TOKEN_ADDR.to_string(),
                    decimals: 6,
                },
            ],
        },
        stellar_chain: StellarChainConfig {
            name: "stellar-test".to_string(),
            relay_url: "http://localhost:9090".to_string(),
            network: "testnet".to_string(),
            operator_addr: DUMMY_OPERATOR_ADDR_STELLAR.to_string(),
            assets: vec!["XLM".to_string(), "USDC".to_string()],
        },
        coordinator: CoordinatorConfig {
            poll_interval_ms: 100,
            ledger_timeout_ms: 5_000,
            min_timelock_secs: 3_600,
            max_timelock_secs: 172_800,
            default_timelock_secs: DUMMY_TIMELOCK_SECS,
            min_amount: Decimal::new(1, 6),
            max_amount: Decimal::new(1_000_000, 0),
        },
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
    }
}

// ============================================================================
// HARNESS BUILDERS
// ============================================================================

/// Coordinator wired to mock ledgers with a manual clock; the handles
/// tests use to inject failures and inspect ledger state.
pub struct TestHarness {
    pub coordinator: Arc<SwapCoordinator>,
    pub clock: Arc<ManualClock>,
    pub evm: Arc<MockLedgerAdapter>,
    pub stellar: Arc<MockLedgerAdapter>,
}

/// Create a coordinator over in-memory mock ledgers, frozen at
/// `DUMMY_NOW`.
pub fn build_test_harness() -> TestHarness {
    let config = Arc::new(build_test_config());
    let clock = Arc::new(ManualClock::new(DUMMY_NOW));
    let evm = Arc::new(MockLedgerAdapter::new(ChainId::Evm, clock.clone()));
    let stellar = Arc::new(MockLedgerAdapter::new(ChainId::Stellar, clock.clone()));

    let coordinator = Arc::new(SwapCoordinator::new(
        config,
        evm.clone(),
        stellar.clone(),
        SwapRegistry::new(),
        clock.clone(),
    ));

    TestHarness {
        coordinator,
        clock,
        evm,
        stellar,
    }
}

/// Create a default ETH -> XLM swap intent with valid addresses and
/// amounts and no explicit timelock or hashlock.
pub fn default_intent() -> SwapIntent {
    SwapIntent {
        swap_id: None,
        source_chain: ChainId::Evm,
        dest_chain: ChainId::Stellar,
        source_asset: "ETH".to_string(),
        dest_asset: "XLM".to_string(),
        source_amount: Decimal::new(15, 1),
        dest_amount: Decimal::new(100, 0),
        source_address: DUMMY_INITIATOR_ADDR_EVM.to_string(),
        dest_address: DUMMY_COUNTERPARTY_ADDR_STELLAR.to_string(),
        timelock: None,
        hashlock: None,
    }
}

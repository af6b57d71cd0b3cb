//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    build_test_config, build_test_harness, default_intent, ManualClock, TestHarness,
    DUMMY_COUNTERPARTY_ADDR_EVM, DUMMY_COUNTERPARTY_ADDR_STELLAR, DUMMY_HTLC_CONTRACT_ADDR,
    DUMMY_INITIATOR_ADDR_EVM, DUMMY_NOW, DUMMY_OPERATOR_ADDR_STELLAR, DUMMY_SENDER_ADDR_EVM,
    DUMMY_TIMELOCK_SECS, DUMMY_USDC_TOKEN_ADDR,
};

//! Unit tests for configuration loading and validation
//!
//! Tests TOML parsing, the config-path environment override, and the
//! startup validation that catches misconfiguration before any swap
//! can reference it.

use std::sync::Mutex;

use htlc_coordinator::config::{validate_address, Config};
use htlc_coordinator::swap::ChainId;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    build_test_config, DUMMY_COUNTERPARTY_ADDR_STELLAR, DUMMY_INITIATOR_ADDR_EVM,
};

/// Serializes tests that mutate the process-global config-path variable
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn valid_toml() -> String {
    format!(
        r#"
[evm_chain]
name = "evm-test"
rpc_url = "http://localhost:8545"
chain_id = 31337
htlc_contract_addr = "0x3333333333333333333333333333333333333333"
sender_addr = "0x4444444444444444444444444444444444444444"

[[evm_chain.assets]]
symbol = "ETH"
token_addr = "0x0000000000000000000000000000000000000000"
decimals = 18

[stellar_chain]
name = "stellar-test"
relay_url = "http://localhost:9090"
network = "testnet"
operator_addr = "{}"
assets = ["XLM"]

[coordinator]
poll_interval_ms = 10000
ledger_timeout_ms = 30000
min_amount = "0.000001"
max_amount = "1000000"

[api]
host = "127.0.0.1"
port = 3000
cors_origins = ["*"]
"#,
        test_helpers::DUMMY_OPERATOR_ADDR_STELLAR
    )
}

// ============================================================================
// LOADING TESTS
// ============================================================================

/// Test loading a valid config file
/// What is tested: TOML parsing, env-var path override, and serde
/// defaults for the timelock bounds
/// Why: The defaults must survive a minimal production config
#[test]
fn test_load_valid_config() {
    let _guard = ENV_LOCK.lock().unwrap();

    let dir = std::env::temp_dir().join("htlc-coordinator-config-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("valid.toml");
    std::fs::write(&path, valid_toml()).unwrap();

    std::env::set_var("HTLC_COORDINATOR_CONFIG_PATH", &path);
    let config = Config::load().unwrap();
    std::env::remove_var("HTLC_COORDINATOR_CONFIG_PATH");

    assert_eq!(config.evm_chain.chain_id, 31337);
    assert_eq!(config.stellar_chain.network, "testnet");
    // Omitted timelock bounds fall back to the documented defaults
    assert_eq!(config.coordinator.min_timelock_secs, 3_600);
    assert_eq!(config.coordinator.max_timelock_secs, 172_800);
    assert_eq!(config.coordinator.default_timelock_secs, 7_200);
}

/// Test the missing-file error
/// What is tested: A nonexistent config path fails with the template
/// hint rather than a bare IO error
/// Why: The first-run experience is copying the template
#[test]
fn test_load_missing_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();

    std::env::set_var(
        "HTLC_COORDINATOR_CONFIG_PATH",
        "/nonexistent/htlc-coordinator.toml",
    );
    let result = Config::load();
    std::env::remove_var("HTLC_COORDINATOR_CONFIG_PATH");

    let message = result.unwrap_err().to_string();
    assert!(message.contains("coordinator.template.toml"));
}

// ============================================================================
// VALIDATION TESTS
// ============================================================================

/// Test that the standard test config validates
#[test]
fn test_valid_config_passes_validation() {
    build_test_config().validate().unwrap();
}

/// Test contract address validation
/// What is tested: A malformed HTLC contract address fails validation
/// Why: Every lock transaction would otherwise fail at submission
#[test]
fn test_invalid_contract_address_rejected() {
    let mut config = build_test_config();
    config.evm_chain.htlc_contract_addr = "0xnothex".to_string();
    assert!(config.validate().is_err());
}

/// Test empty asset list rejection
#[test]
fn test_empty_asset_list_rejected() {
    let mut config = build_test_config();
    config.evm_chain.assets.clear();
    assert!(config.validate().is_err());

    let mut config = build_test_config();
    config.stellar_chain.assets.clear();
    assert!(config.validate().is_err());
}

/// Test network name validation
#[test]
fn test_unknown_stellar_network_rejected() {
    let mut config = build_test_config();
    config.stellar_chain.network = "mainnet".to_string();
    assert!(config.validate().is_err());
}

/// Test timelock bound ordering
/// What is tested: min >= max and an out-of-window default both fail
/// Why: Inverted bounds would reject every swap with a confusing error
#[test]
fn test_timelock_bounds_validated() {
    let mut config = build_test_config();
    config.coordinator.min_timelock_secs = 200_000;
    assert!(config.validate().is_err());

    let mut config = build_test_config();
    config.coordinator.default_timelock_secs = 600;
    assert!(config.validate().is_err());
}

/// Test amount bound ordering
#[test]
fn test_amount_bounds_validated() {
    let mut config = build_test_config();
    config.coordinator.min_amount = config.coordinator.max_amount;
    assert!(config.validate().is_err());
}

// ============================================================================
// ADDRESS VALIDATION TESTS
// ============================================================================

/// Test per-chain address format checks
/// What is tested: Well-formed addresses pass, malformed ones fail, and
/// the chains do not accept each other's formats
/// Why: Address validation is the last stop before funds move toward an
/// unspendable destination
#[test]
fn test_validate_address_formats() {
    assert!(validate_address(ChainId::Evm, DUMMY_INITIATOR_ADDR_EVM).is_ok());
    assert!(validate_address(ChainId::Stellar, DUMMY_COUNTERPARTY_ADDR_STELLAR).is_ok());

    // Wrong chain for the format
    assert!(validate_address(ChainId::Evm, DUMMY_COUNTERPARTY_ADDR_STELLAR).is_err());
    assert!(validate_address(ChainId::Stellar, DUMMY_INITIATOR_ADDR_EVM).is_err());

    // Malformed variants
    assert!(validate_address(ChainId::Evm, "0x1234").is_err());
    assert!(validate_address(ChainId::Evm, "4444444444444444444444444444444444444444").is_err());
    assert!(validate_address(ChainId::Stellar, "GSHORT").is_err());
    assert!(validate_address(
        ChainId::Stellar,
        "gdqp2kpqgkihyjgxnuiyomharuarca7djt5fo2ffooky3b2wsqhg4w37"
    )
    .is_err());
}

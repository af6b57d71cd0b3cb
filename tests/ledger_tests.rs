//! Unit tests for the ledger adapters
//!
//! Tests the Stellar relay client and the EVM JSON-RPC client against
//! mock HTTP servers: request shapes, response decoding, error-taxonomy
//! mapping, and base-unit amount conversion.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use htlc_coordinator::error::LedgerError;
use htlc_coordinator::htlc::{compute_hashlock, ContractId, Hashlock, Preimage};
use htlc_coordinator::ledger::evm::to_base_units;
use htlc_coordinator::ledger::{
    EvmLedgerAdapter, LedgerAdapter, LockParams, StellarLedgerAdapter,
};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    build_test_config, DUMMY_COUNTERPARTY_ADDR_EVM, DUMMY_COUNTERPARTY_ADDR_STELLAR, DUMMY_NOW,
};

const TIMEOUT: Duration = Duration::from_secs(2);

fn sample_contract_id() -> ContractId {
    ContractId::from_hex("0x0707070707070707070707070707070707070707070707070707070707070707")
        .unwrap()
}

fn sample_lock_params(asset: &str, amount: Decimal) -> LockParams {
    let preimage = Preimage::from_hex(
        "0x0101010101010101010101010101010101010101010101010101010101010101",
    )
    .unwrap();
    LockParams {
        contract_id: sample_contract_id(),
        counterparty: DUMMY_COUNTERPARTY_ADDR_STELLAR.to_string(),
        asset: asset.to_string(),
        amount,
        hashlock: compute_hashlock(&preimage),
        timelock: DUMMY_NOW + 7_200,
    }
}

async fn stellar_adapter(server: &MockServer) -> StellarLedgerAdapter {
    let mut config = build_test_config().stellar_chain;
    config.relay_url = server.uri();
    StellarLedgerAdapter::new(&config, TIMEOUT).unwrap()
}

async fn evm_adapter(server: &MockServer) -> EvmLedgerAdapter {
    let mut config = build_test_config().evm_chain;
    config.rpc_url = server.uri();
    EvmLedgerAdapter::new(&config, TIMEOUT).unwrap()
}

// ============================================================================
// STELLAR RELAY ADAPTER TESTS
// ============================================================================

/// Test the relay lock request
/// What is tested: POST /htlc carries the HTLC parameters and the
/// returned tx_ref is surfaced
/// Why: The relay enforces exactly what this payload tells it to
#[tokio::test]
async fn test_stellar_lock_posts_htlc() {
    let server = MockServer::start().await;
    let params = sample_lock_params("XLM", Decimal::new(100, 0));

    Mock::given(method("POST"))
        .and(path("/htlc"))
        .and(body_partial_json(json!({
            "contract_id": params.contract_id.to_hex(),
            "counterparty": DUMMY_COUNTERPARTY_ADDR_STELLAR,
            "asset": "XLM",
            "timelock": DUMMY_NOW + 7_200,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_ref": "stellar-tx-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = stellar_adapter(&server).await;
    let tx_ref = adapter.lock(&params).await.unwrap();
    assert_eq!(tx_ref, "stellar-tx-42");
}

/// Test relay error-kind mapping
/// What is tested: Machine-readable relay error kinds map onto the
/// shared ledger taxonomy
/// Why: The coordinator's retry and state logic branches on the
/// normalized error, never on relay specifics
#[tokio::test]
async fn test_stellar_error_kind_mapping() {
    let server = MockServer::start().await;
    let contract_id = sample_contract_id();
    let preimage = Preimage::generate();

    Mock::given(method("POST"))
        .and(path(format!("/htlc/{}/withdraw", contract_id.to_hex())))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_kind": "invalid_preimage",
            "message": "hashlock mismatch"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/htlc/{}/refund", contract_id.to_hex())))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error_kind": "timelock_not_expired",
            "message": "too early"
        })))
        .mount(&server)
        .await;

    let adapter = stellar_adapter(&server).await;

    let withdraw = adapter.withdraw(&contract_id, &preimage).await;
    assert_eq!(withdraw.unwrap_err(), LedgerError::InvalidPreimage);

    let refund = adapter.refund(&contract_id).await;
    assert_eq!(refund.unwrap_err(), LedgerError::TimelockNotExpired);
}

/// Test missing-contract reads
/// What is tested: A bare 404 (no error body) maps to NotFound
/// Why: Reconciliation treats NotFound as "lock never landed", which
/// must not be confused with a transport failure
#[tokio::test]
async fn test_stellar_read_not_found() {
    let server = MockServer::start().await;
    let contract_id = sample_contract_id();

    Mock::given(method("GET"))
        .and(path(format!("/htlc/{}", contract_id.to_hex())))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = stellar_adapter(&server).await;
    let result = adapter.read(&contract_id).await;
    assert_eq!(result.unwrap_err(), LedgerError::NotFound);
}

/// Test server-error mapping
/// What is tested: A 5xx without an error kind maps to Unreachable
/// Why: Unreachable is the only retryable class; misclassifying a
/// relay outage would wedge swaps
#[tokio::test]
async fn test_stellar_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/htlc"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let adapter = stellar_adapter(&server).await;
    let result = adapter
        .lock(&sample_lock_params("XLM", Decimal::new(100, 0)))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, LedgerError::Unreachable(_)));
    assert!(err.is_retryable());
}

// ============================================================================
// EVM JSON-RPC ADAPTER TESTS
// ============================================================================

/// Test the lock transaction encoding
/// What is tested: A native-asset lock sends eth_sendTransaction with
/// the newContract calldata and the amount in the value field
/// Why: A wrong word in this payload locks the wrong funds
#[tokio::test]
async fn test_evm_lock_sends_transaction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0xffee0011"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = evm_adapter(&server).await;
    let mut params = sample_lock_params("ETH", Decimal::new(15, 1));
    params.counterparty = DUMMY_COUNTERPARTY_ADDR_EVM.to_string();
    let tx_ref = adapter.lock(&params).await.unwrap();
    assert_eq!(tx_ref, "0xffee0011");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let tx = &body["params"][0];
    let data = tx["data"].as_str().unwrap();
    // newContract selector followed by six 32-byte words
    assert!(data.starts_with("0x8a1bf1f4"));
    assert_eq!(data.len(), 10 + 6 * 64);
    // Native asset: 1.5 ETH rides along as the transaction value
    assert_eq!(tx["value"].as_str().unwrap(), "0x14d1120d7b160000");
}

/// Test revert-reason mapping
/// What is tested: Node revert messages map onto the shared taxonomy
/// Why: Withdraw/refund sequencing reacts to these exact variants
#[tokio::test]
async fn test_evm_revert_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted: already withdrawn" }
        })))
        .mount(&server)
        .await;

    let adapter = evm_adapter(&server).await;
    let result = adapter.refund(&sample_contract_id()).await;
    assert_eq!(result.unwrap_err(), LedgerError::AlreadyWithdrawn);
}

/// Test getContract decoding
/// What is tested: A 10-word eth_call payload decodes into a full
/// contract record with the token resolved to its asset symbol
/// Why: Reconciliation trusts this decoding as the source of truth
#[tokio::test]
async fn test_evm_read_decodes_record() {
    let server = MockServer::start().await;

    let preimage = Preimage::from_hex(
        "0x0202020202020202020202020202020202020202020202020202020202020202",
    )
    .unwrap();
    let hashlock = compute_hashlock(&preimage);

    // (initiator, participant, token, amount, hashlock, timelock,
    // withdrawn, refunded, preimage, createdAt)
    let mut payload = String::from("0x");
    payload.push_str(&format!("{:0>64}", "1111111111111111111111111111111111111111"));
    payload.push_str(&format!("{:0>64}", "2222222222222222222222222222222222222222"));
    payload.push_str(&format!("{:0>64}", "0")); // native token
    payload.push_str(&format!("{:0>64x}", 1_500_000_000_000_000_000u128));
    payload.push_str(&hex::encode(hashlock.as_bytes()));
    payload.push_str(&format!("{:0>64x}", DUMMY_NOW + 7_200));
    payload.push_str(&format!("{:0>64x}", 1u8)); // withdrawn
    payload.push_str(&format!("{:0>64x}", 0u8)); // refunded
    payload.push_str(&hex::encode(preimage.as_bytes()));
    payload.push_str(&format!("{:0>64x}", DUMMY_NOW));

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_call"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": payload
        })))
        .mount(&server)
        .await;

    let adapter = evm_adapter(&server).await;
    let record = adapter.read(&sample_contract_id()).await.unwrap();

    assert_eq!(record.asset, "ETH");
    assert_eq!(record.amount, Decimal::new(15, 1));
    assert_eq!(record.hashlock, hashlock);
    assert_eq!(record.timelock, DUMMY_NOW + 7_200);
    assert!(record.withdrawn);
    assert!(!record.refunded);
    assert_eq!(record.preimage, Some(preimage));
}

/// Test missing-contract reads
/// What is tested: A zeroed initiator word decodes to NotFound
/// Why: The contract returns an all-zero struct for unknown ids
#[tokio::test]
async fn test_evm_read_zeroed_record_not_found() {
    let server = MockServer::start().await;

    let payload = format!("0x{}", "0".repeat(10 * 64));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": payload
        })))
        .mount(&server)
        .await;

    let adapter = evm_adapter(&server).await;
    let result = adapter.read(&sample_contract_id()).await;
    assert_eq!(result.unwrap_err(), LedgerError::NotFound);
}

// ============================================================================
// AMOUNT CONVERSION TESTS
// ============================================================================

/// Test base-unit conversion
/// What is tested: Exact conversions succeed; amounts with more
/// fractional digits than the asset's decimals are rejected
/// Why: Silent rounding at lock time is a fund-loss bug
#[test]
fn test_to_base_units() {
    assert_eq!(
        to_base_units(&Decimal::new(15, 1), 18).unwrap(),
        1_500_000_000_000_000_000
    );
    assert_eq!(to_base_units(&Decimal::new(1, 0), 6).unwrap(), 1_000_000);
    assert_eq!(to_base_units(&Decimal::new(123_456, 6), 6).unwrap(), 123_456);

    // 0.1234567 with 6 decimals would round
    assert!(to_base_units(&Decimal::new(1_234_567, 7), 6).is_err());
}

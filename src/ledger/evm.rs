//! EVM Ledger Adapter
//!
//! JSON-RPC client driving the on-chain HTLC contract on an
//! EVM-compatible chain. Transactions are submitted through the node's
//! configured sender account (`eth_sendTransaction`); reads go through
//! `eth_call`. ABI payloads are built and decoded by hand as 32-byte
//! words, matching the contract's fixed operation set.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ContractRecord, LedgerAdapter, LockParams};
use crate::config::EvmChainConfig;
use crate::error::LedgerError;
use crate::htlc::{ContractId, Hashlock, Preimage, COMMITMENT_LEN};
use crate::swap::ChainId;

// ============================================================================
// CONTRACT ABI CONSTANTS
// ============================================================================

// 4-byte function selectors of the HTLC contract.
// newContract(bytes32,address,address,uint256,bytes32,uint256)
const SELECTOR_NEW_CONTRACT: &str = "0x8a1bf1f4";
// withdraw(bytes32,bytes32)
const SELECTOR_WITHDRAW: &str = "0x63615149";
// refund(bytes32)
const SELECTOR_REFUND: &str = "0x7249fbb6";
// getContract(bytes32)
const SELECTOR_GET_CONTRACT: &str = "0xe16c7d98";

/// Token address used for the chain's native asset.
const NATIVE_TOKEN_ADDR: &str = "0x0000000000000000000000000000000000000000";

/// Number of 32-byte words in the getContract return payload:
/// (initiator, participant, token, amount, hashlock, timelock,
/// withdrawn, refunded, preimage, createdAt).
const GET_CONTRACT_WORDS: usize = 10;

// ============================================================================
// JSON-RPC TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Ledger adapter for the EVM-side HTLC contract.
pub struct EvmLedgerAdapter {
    client: Client,
    rpc_url: String,
    contract_addr: String,
    sender_addr: String,
    /// asset symbol -> (token address, decimals)
    assets: HashMap<String, (String, u32)>,
    /// token address (lowercase) -> asset symbol, for read decoding
    symbols: HashMap<String, String>,
}

impl EvmLedgerAdapter {
    /// Creates an adapter from the EVM chain configuration.
    pub fn new(config: &EvmChainConfig, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        let mut assets = HashMap::new();
        let mut symbols = HashMap::new();
        for asset in &config.assets {
            assets.insert(
                asset.symbol.clone(),
                (asset.token_addr.clone(), asset.decimals),
            );
            symbols.insert(asset.token_addr.to_lowercase(), asset.symbol.clone());
        }

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract_addr: config.htlc_contract_addr.clone(),
            sender_addr: config.sender_addr.clone(),
            assets,
            symbols,
        })
    }

    /// Sends a JSON-RPC request and unwraps the result field.
    async fn rpc<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, LedgerError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("EVM RPC request failed: {}", e)))?;

        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("Invalid EVM RPC response: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(map_node_error(&err.message));
        }

        parsed
            .result
            .ok_or_else(|| LedgerError::Unreachable("EVM RPC response missing result".to_string()))
    }

    /// Submits a transaction to the HTLC contract from the configured
    /// sender account.
    async fn send_transaction(
        &self,
        data: String,
        value: Option<u128>,
    ) -> Result<String, LedgerError> {
        let mut tx = serde_json::json!({
            "from": self.sender_addr,
            "to": self.contract_addr,
            "data": data,
        });
        if let Some(value) = value {
            tx["value"] = serde_json::json!(format!("0x{:x}", value));
        }

        self.rpc::<String>("eth_sendTransaction", serde_json::json!([tx]))
            .await
    }

    /// Resolves an asset symbol to its token address and decimals.
    fn resolve_asset(&self, symbol: &str) -> Result<(&str, u32), LedgerError> {
        self.assets
            .get(symbol)
            .map(|(addr, decimals)| (addr.as_str(), *decimals))
            .ok_or_else(|| LedgerError::Reverted(format!("unknown EVM asset: {}", symbol)))
    }
}

#[async_trait]
impl LedgerAdapter for EvmLedgerAdapter {
    fn chain(&self) -> ChainId {
        ChainId::Evm
    }

    async fn lock(&self, params: &LockParams) -> Result<String, LedgerError> {
        let (token_addr, decimals) = self.resolve_asset(&params.asset)?;
        let base_units = to_base_units(&params.amount, decimals)?;
        let native = token_addr.eq_ignore_ascii_case(NATIVE_TOKEN_ADDR);

        let mut data = String::from(SELECTOR_NEW_CONTRACT);
        data.push_str(&word_bytes32(params.contract_id.as_bytes()));
        data.push_str(&word_address(&params.counterparty)?);
        data.push_str(&word_address(token_addr)?);
        data.push_str(&word_u128(base_units));
        data.push_str(&word_bytes32(params.hashlock.as_bytes()));
        data.push_str(&word_u128(params.timelock as u128));

        self.send_transaction(data, native.then_some(base_units))
            .await
    }

    async fn withdraw(
        &self,
        contract_id: &ContractId,
        preimage: &Preimage,
    ) -> Result<String, LedgerError> {
        let mut data = String::from(SELECTOR_WITHDRAW);
        data.push_str(&word_bytes32(contract_id.as_bytes()));
        data.push_str(&word_bytes32(preimage.as_bytes()));

        self.send_transaction(data, None).await
    }

    async fn refund(&self, contract_id: &ContractId) -> Result<String, LedgerError> {
        let mut data = String::from(SELECTOR_REFUND);
        data.push_str(&word_bytes32(contract_id.as_bytes()));

        self.send_transaction(data, None).await
    }

    async fn read(&self, contract_id: &ContractId) -> Result<ContractRecord, LedgerError> {
        let mut data = String::from(SELECTOR_GET_CONTRACT);
        data.push_str(&word_bytes32(contract_id.as_bytes()));

        let call = serde_json::json!([{
            "to": self.contract_addr,
            "data": data,
        }, "latest"]);

        let raw: String = self.rpc("eth_call", call).await?;
        self.decode_contract_record(&raw)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        self.rpc::<String>("eth_blockNumber", serde_json::json!([]))
            .await
            .map(|_| ())
    }
}

impl EvmLedgerAdapter {
    /// Decodes the getContract return payload into a [`ContractRecord`].
    fn decode_contract_record(&self, raw: &str) -> Result<ContractRecord, LedgerError> {
        let words = decode_words(raw, GET_CONTRACT_WORDS)?;

        let initiator = address_from_word(&words[0]);
        // A zeroed initiator means the contract id has no entry.
        if initiator == NATIVE_TOKEN_ADDR {
            return Err(LedgerError::NotFound);
        }
        let participant = address_from_word(&words[1]);
        let token_addr = address_from_word(&words[2]);
        let base_units = u128_from_word(&words[3])?;
        let mut hashlock = [0u8; COMMITMENT_LEN];
        hashlock.copy_from_slice(&words[4]);
        let timelock = u128_from_word(&words[5])? as u64;
        let withdrawn = words[6][31] != 0;
        let refunded = words[7][31] != 0;
        let preimage = if withdrawn && words[8].iter().any(|b| *b != 0) {
            let mut bytes = [0u8; COMMITMENT_LEN];
            bytes.copy_from_slice(&words[8]);
            Some(Preimage(bytes))
        } else {
            None
        };
        let created_at = u128_from_word(&words[9])? as u64;

        let (asset, decimals) = match self.symbols.get(&token_addr) {
            Some(symbol) => (
                symbol.clone(),
                self.assets.get(symbol).map(|(_, d)| *d).unwrap_or(18),
            ),
            None => (token_addr.clone(), 18),
        };

        Ok(ContractRecord {
            initiator,
            participant,
            asset,
            amount: from_base_units(base_units, decimals)?,
            hashlock: Hashlock(hashlock),
            timelock,
            withdrawn,
            refunded,
            preimage,
            created_at,
        })
    }
}

// ============================================================================
// ABI ENCODING HELPERS
// ============================================================================

/// Encodes 32 raw bytes as one ABI word (hex without prefix).
fn word_bytes32(bytes: &[u8; COMMITMENT_LEN]) -> String {
    hex::encode(bytes)
}

/// Encodes a u128 as a left-padded 32-byte ABI word.
fn word_u128(value: u128) -> String {
    format!("{:0>64x}", value)
}

/// Encodes a 20-byte address as a left-padded 32-byte ABI word.
fn word_address(addr: &str) -> Result<String, LedgerError> {
    let stripped = addr.strip_prefix("0x").unwrap_or(addr);
    let bytes = hex::decode(stripped)
        .map_err(|_| LedgerError::Reverted(format!("invalid EVM address: {}", addr)))?;
    if bytes.len() != 20 {
        return Err(LedgerError::Reverted(format!(
            "invalid EVM address length: {}",
            addr
        )));
    }
    Ok(format!("{:0>64}", hex::encode(bytes)))
}

/// Splits a `0x`-prefixed hex return payload into fixed 32-byte words.
fn decode_words(raw: &str, expected: usize) -> Result<Vec<[u8; 32]>, LedgerError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped)
        .map_err(|e| LedgerError::Unreachable(format!("invalid call payload hex: {}", e)))?;
    if bytes.is_empty() {
        return Err(LedgerError::NotFound);
    }
    if bytes.len() != expected * 32 {
        return Err(LedgerError::Unreachable(format!(
            "unexpected call payload length: {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Extracts a 20-byte address from the tail of an ABI word.
fn address_from_word(word: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(&word[12..]))
}

/// Extracts a u128 from an ABI word, rejecting values above 2^128.
fn u128_from_word(word: &[u8; 32]) -> Result<u128, LedgerError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(LedgerError::Reverted(
            "uint256 value exceeds supported range".to_string(),
        ));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(buf))
}

// ============================================================================
// AMOUNT CONVERSION
// ============================================================================

/// Converts a decimal amount to integer base units with the asset's
/// decimals. Rejects amounts with a fractional remainder: silent
/// rounding here is a fund-loss bug.
pub fn to_base_units(amount: &Decimal, decimals: u32) -> Result<u128, LedgerError> {
    let mut scaled = *amount;
    scaled.rescale(decimals);
    if scaled.normalize() != amount.normalize() {
        return Err(LedgerError::Reverted(format!(
            "amount {} not representable with {} decimals",
            amount, decimals
        )));
    }
    let mantissa = scaled.mantissa();
    if mantissa < 0 {
        return Err(LedgerError::Reverted("amount must be positive".to_string()));
    }
    Ok(mantissa as u128)
}

/// Converts integer base units back to a decimal amount.
fn from_base_units(base_units: u128, decimals: u32) -> Result<Decimal, LedgerError> {
    let mantissa = i128::try_from(base_units)
        .map_err(|_| LedgerError::Reverted("amount exceeds decimal range".to_string()))?;
    Ok(Decimal::from_i128_with_scale(mantissa, decimals).normalize())
}

// ============================================================================
// ERROR NORMALIZATION
// ============================================================================

/// Maps a node/revert error message onto the shared ledger taxonomy.
fn map_node_error(message: &str) -> LedgerError {
    let lower = message.to_lowercase();
    if lower.contains("hashlock hash does not match") || lower.contains("invalid preimage") {
        LedgerError::InvalidPreimage
    } else if lower.contains("already withdrawn") {
        LedgerError::AlreadyWithdrawn
    } else if lower.contains("already refunded") {
        LedgerError::AlreadyRefunded
    } else if lower.contains("timelock not yet passed") || lower.contains("timelock not expired") {
        LedgerError::TimelockNotExpired
    } else if lower.contains("contractid does not exist") || lower.contains("not found") {
        LedgerError::NotFound
    } else if lower.contains("insufficient funds") {
        LedgerError::InsufficientFunds
    } else {
        LedgerError::Reverted(message.to_string())
    }
}

//! Stellar Ledger Adapter
//!
//! REST client for the Stellar-side HTLC relay. Stellar has no native
//! hashlock contract, so the relay holds the locked funds and enforces
//! the hashlock/timelock conditions off-chain, submitting the actual
//! Stellar payments. This leg is therefore trust-minimized only up to
//! the relay operator; the adapter surface is identical to the on-chain
//! EVM leg so the coordinator is unaffected.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ContractRecord, LedgerAdapter, LockParams};
use crate::config::StellarChainConfig;
use crate::error::LedgerError;
use crate::htlc::{ContractId, Hashlock, Preimage};
use crate::swap::ChainId;

// ============================================================================
// RELAY WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateHtlcRequest<'a> {
    contract_id: &'a ContractId,
    counterparty: &'a str,
    asset: &'a str,
    /// Decimal string; the relay handles stroop conversion.
    amount: &'a Decimal,
    hashlock: &'a Hashlock,
    timelock: u64,
}

#[derive(Debug, Serialize)]
struct WithdrawRequest {
    preimage: String,
}

#[derive(Debug, Deserialize)]
struct TxRefResponse {
    tx_ref: String,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    #[serde(default)]
    error_kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Ledger adapter for the Stellar-side HTLC relay.
pub struct StellarLedgerAdapter {
    client: Client,
    relay_url: String,
}

impl StellarLedgerAdapter {
    /// Creates an adapter from the Stellar chain configuration.
    pub fn new(config: &StellarChainConfig, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            relay_url: config.relay_url.trim_end_matches('/').to_string(),
        })
    }

    fn htlc_url(&self, contract_id: &ContractId) -> String {
        format!("{}/htlc/{}", self.relay_url, contract_id.to_hex())
    }

    /// Maps a non-success relay response onto the shared taxonomy.
    async fn map_error_response(response: reqwest::Response) -> LedgerError {
        let status = response.status();
        let body: RelayErrorBody = response.json().await.unwrap_or(RelayErrorBody {
            error_kind: None,
            message: None,
        });
        let message = body.message.unwrap_or_else(|| status.to_string());

        match body.error_kind.as_deref() {
            Some("invalid_preimage") => LedgerError::InvalidPreimage,
            Some("already_withdrawn") => LedgerError::AlreadyWithdrawn,
            Some("already_refunded") => LedgerError::AlreadyRefunded,
            Some("timelock_not_expired") => LedgerError::TimelockNotExpired,
            Some("not_found") => LedgerError::NotFound,
            Some("insufficient_funds") => LedgerError::InsufficientFunds,
            Some(_) => LedgerError::Reverted(message),
            None if status == StatusCode::NOT_FOUND => LedgerError::NotFound,
            None if status.is_server_error() => LedgerError::Unreachable(message),
            None => LedgerError::Reverted(message),
        }
    }

    async fn submit<B: Serialize>(
        &self,
        url: String,
        body: Option<&B>,
    ) -> Result<String, LedgerError> {
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("relay request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::map_error_response(response).await);
        }

        let parsed: TxRefResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("invalid relay response: {}", e)))?;
        Ok(parsed.tx_ref)
    }
}

#[async_trait]
impl LedgerAdapter for StellarLedgerAdapter {
    fn chain(&self) -> ChainId {
        ChainId::Stellar
    }

    async fn lock(&self, params: &LockParams) -> Result<String, LedgerError> {
        let body = CreateHtlcRequest {
            contract_id: &params.contract_id,
            counterparty: &params.counterparty,
            asset: &params.asset,
            amount: &params.amount,
            hashlock: &params.hashlock,
            timelock: params.timelock,
        };
        self.submit(format!("{}/htlc", self.relay_url), Some(&body))
            .await
    }

    async fn withdraw(
        &self,
        contract_id: &ContractId,
        preimage: &Preimage,
    ) -> Result<String, LedgerError> {
        let body = WithdrawRequest {
            preimage: preimage.to_hex(),
        };
        self.submit(format!("{}/withdraw", self.htlc_url(contract_id)), Some(&body))
            .await
    }

    async fn refund(&self, contract_id: &ContractId) -> Result<String, LedgerError> {
        self.submit::<()>(format!("{}/refund", self.htlc_url(contract_id)), None)
            .await
    }

    async fn read(&self, contract_id: &ContractId) -> Result<ContractRecord, LedgerError> {
        let response = self
            .client
            .get(self.htlc_url(contract_id))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("relay request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::map_error_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("invalid relay record: {}", e)))
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        let response = self
            .client
            .get(format!("{}/health", self.relay_url))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("relay unreachable: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LedgerError::Unreachable(format!(
                "relay health check returned {}",
                response.status()
            )))
        }
    }
}

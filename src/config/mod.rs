//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the
//! coordinator service: chain endpoints, supported assets, timelock and
//! amount bounds, and API settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::swap::ChainId;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// EVM chain configuration (on-chain HTLC contract side).
    pub evm_chain: EvmChainConfig,
    /// Stellar-side configuration (HTLC relay side).
    pub stellar_chain: StellarChainConfig,
    /// Coordinator-specific settings (timing, bounds).
    pub coordinator: CoordinatorConfig,
    /// API server configuration (host, port, CORS settings).
    pub api: ApiConfig,
}

/// Configuration for the EVM chain connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmChainConfig {
    /// Human-readable name for the chain.
    pub name: String,
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Unique chain identifier (e.g. 11155111 for Sepolia).
    pub chain_id: u64,
    /// Address of the deployed HTLC contract.
    pub htlc_contract_addr: String,
    /// Node account transactions are sent from.
    pub sender_addr: String,
    /// Assets the coordinator will lock on this chain.
    pub assets: Vec<EvmAssetConfig>,
}

/// A supported asset on the EVM chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmAssetConfig {
    /// Asset symbol (e.g. "ETH", "USDC").
    pub symbol: String,
    /// ERC-20 token address; the zero address for the native asset.
    pub token_addr: String,
    /// Base-unit decimals (18 for ETH, 6 for USDC).
    pub decimals: u32,
}

/// Configuration for the Stellar-side HTLC relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StellarChainConfig {
    /// Human-readable name for the ledger.
    pub name: String,
    /// Base URL of the HTLC relay service.
    pub relay_url: String,
    /// Stellar network the relay operates on ("testnet" or "public").
    pub network: String,
    /// Operator account on the Stellar ledger (claims source-side locks
    /// and funds destination-side locks).
    pub operator_addr: String,
    /// Asset symbols the coordinator will lock on this ledger.
    pub assets: Vec<String>,
}

/// Coordinator timing and bounds settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Reconciliation poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Deadline for each ledger call in milliseconds.
    pub ledger_timeout_ms: u64,
    /// Minimum source lock duration in seconds (default 1 hour).
    #[serde(default = "default_min_timelock_secs")]
    pub min_timelock_secs: u64,
    /// Maximum source lock duration in seconds (default 48 hours).
    #[serde(default = "default_max_timelock_secs")]
    pub max_timelock_secs: u64,
    /// Source lock duration applied when the intent omits a timelock.
    #[serde(default = "default_timelock_secs")]
    pub default_timelock_secs: u64,
    /// Smallest acceptable swap amount (decimal string).
    pub min_amount: Decimal,
    /// Largest acceptable swap amount (decimal string).
    pub max_amount: Decimal,
}

fn default_min_timelock_secs() -> u64 {
    3_600
}

fn default_max_timelock_secs() -> u64 {
    172_800
}

fn default_timelock_secs() -> u64 {
    7_200
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to.
    pub host: String,
    /// Port number to bind the API server to.
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests.
    pub cors_origins: Vec<String>,
}

// ============================================================================
// CONFIGURATION LOADING AND VALIDATION
// ============================================================================

impl Config {
    /// Loads configuration from the TOML file.
    ///
    /// The path comes from `HTLC_COORDINATOR_CONFIG_PATH` when set,
    /// falling back to `config/coordinator.toml`.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("HTLC_COORDINATOR_CONFIG_PATH")
            .unwrap_or_else(|_| "config/coordinator.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/coordinator.template.toml config/coordinator.toml\n\
                Then edit config/coordinator.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Validates the configuration.
    ///
    /// Checks address formats, asset lists, and timelock/amount bounds
    /// so misconfiguration is caught at startup rather than mid-swap.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_address(ChainId::Evm, &self.evm_chain.htlc_contract_addr)
            .map_err(|e| anyhow::anyhow!("Invalid htlc_contract_addr: {}", e))?;
        validate_address(ChainId::Evm, &self.evm_chain.sender_addr)
            .map_err(|e| anyhow::anyhow!("Invalid sender_addr: {}", e))?;

        if self.evm_chain.assets.is_empty() {
            anyhow::bail!("Configuration error: evm_chain.assets must not be empty");
        }
        for asset in &self.evm_chain.assets {
            validate_evm_hex_address(&asset.token_addr).map_err(|e| {
                anyhow::anyhow!("Invalid token_addr for asset {}: {}", asset.symbol, e)
            })?;
            if asset.decimals > 28 {
                anyhow::bail!(
                    "Configuration error: asset {} decimals {} exceeds supported precision",
                    asset.symbol,
                    asset.decimals
                );
            }
        }

        validate_address(ChainId::Stellar, &self.stellar_chain.operator_addr)
            .map_err(|e| anyhow::anyhow!("Invalid stellar operator_addr: {}", e))?;
        if self.stellar_chain.assets.is_empty() {
            anyhow::bail!("Configuration error: stellar_chain.assets must not be empty");
        }
        if !matches!(self.stellar_chain.network.as_str(), "testnet" | "public") {
            anyhow::bail!(
                "Configuration error: stellar_chain.network must be 'testnet' or 'public', got '{}'",
                self.stellar_chain.network
            );
        }

        let c = &self.coordinator;
        if c.min_timelock_secs >= c.max_timelock_secs {
            anyhow::bail!(
                "Configuration error: min_timelock_secs {} must be less than max_timelock_secs {}",
                c.min_timelock_secs,
                c.max_timelock_secs
            );
        }
        if c.default_timelock_secs < c.min_timelock_secs
            || c.default_timelock_secs > c.max_timelock_secs
        {
            anyhow::bail!(
                "Configuration error: default_timelock_secs {} outside [{}, {}]",
                c.default_timelock_secs,
                c.min_timelock_secs,
                c.max_timelock_secs
            );
        }
        if c.min_amount <= Decimal::ZERO || c.min_amount >= c.max_amount {
            anyhow::bail!(
                "Configuration error: amount bounds must satisfy 0 < min_amount < max_amount"
            );
        }

        Ok(())
    }

    /// Whether a chain supports the given asset symbol.
    pub fn supports_asset(&self, chain: ChainId, symbol: &str) -> bool {
        match chain {
            ChainId::Evm => self.evm_chain.assets.iter().any(|a| a.symbol == symbol),
            ChainId::Stellar => self.stellar_chain.assets.iter().any(|a| a == symbol),
        }
    }

    /// Base-unit decimals for an EVM asset, if configured.
    pub fn evm_asset_decimals(&self, symbol: &str) -> Option<u32> {
        self.evm_chain
            .assets
            .iter()
            .find(|a| a.symbol == symbol)
            .map(|a| a.decimals)
    }
}

// ============================================================================
// ADDRESS VALIDATION
// ============================================================================

/// Validates that an address is well-formed for its chain.
///
/// - EVM: `0x`-prefixed hex, 20 bytes.
/// - Stellar: 56-character `G...` public key (base32 alphabet).
pub fn validate_address(chain: ChainId, address: &str) -> Result<(), String> {
    match chain {
        ChainId::Evm => validate_evm_hex_address(address),
        ChainId::Stellar => {
            if address.len() != 56 || !address.starts_with('G') {
                return Err(format!(
                    "Stellar address must be a 56-character G... public key, got '{}'",
                    address
                ));
            }
            if !address
                .bytes()
                .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
            {
                return Err("Stellar address contains invalid base32 characters".to_string());
            }
            Ok(())
        }
    }
}

/// Validates a `0x`-prefixed 20-byte hex address.
fn validate_evm_hex_address(address: &str) -> Result<(), String> {
    let stripped = address
        .strip_prefix("0x")
        .ok_or_else(|| "address must be a 0x-prefixed hex string".to_string())?;
    let bytes = hex::decode(stripped).map_err(|_| "invalid hex address".to_string())?;
    if bytes.len() != 20 {
        return Err(format!("expected 20 bytes, got {}", bytes.len()));
    }
    Ok(())
}

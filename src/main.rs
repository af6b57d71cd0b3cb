//! HTLC Swap Coordinator Service
//!
//! A coordinator service that drives cross-chain atomic swaps through
//! hashed-timelock contracts on an EVM chain and a Stellar ledger. The
//! coordinator holds swap preimages in process memory until reveal, tracks
//! swap state in an in-memory registry, and reconciles registry state
//! against on-ledger contract state in the background.
//!
//! ## Overview
//!
//! The coordinator:
//! 1. Validates and registers swap intents with deterministic contract ids
//! 2. Locks funds on the source chain, then on the destination chain
//! 3. Reveals the preimage and settles both sides on completion
//! 4. Refunds expired locks, destination side first
//! 5. Reconciles registry state against on-ledger state in the background

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

mod api;
mod clock;
mod config;
mod coordinator;
mod error;
mod htlc;
mod ledger;
mod reconcile;
mod registry;
mod swap;

use clock::SystemClock;
use config::Config;
use coordinator::SwapCoordinator;
use ledger::{EvmLedgerAdapter, LedgerAdapter, StellarLedgerAdapter};
use reconcile::ReconciliationPoller;
use registry::SwapRegistry;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the coordinator.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Builds the ledger adapters and the swap registry
/// 4. Spawns the background reconciliation poller
/// 5. Runs the API server until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting HTLC Swap Coordinator");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("HTLC Swap Coordinator");
        println!();
        println!("Usage: htlc-coordinator [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --testnet, -t    Use testnet configuration (config/coordinator_testnet.toml)");
        println!("  --config <path>   Use custom config file path (overrides --testnet)");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  HTLC_COORDINATOR_CONFIG_PATH    Path to config file (overrides --config and --testnet)");
        return Ok(());
    }

    // Check for custom config path
    let mut config_path = None;
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            break;
        }
    }

    // Set config path based on flags
    if let Some(path) = config_path {
        std::env::set_var("HTLC_COORDINATOR_CONFIG_PATH", &path);
        info!("Using custom config: {}", path);
    } else if args.iter().any(|arg| arg == "--testnet" || arg == "-t") {
        std::env::set_var(
            "HTLC_COORDINATOR_CONFIG_PATH",
            "config/coordinator_testnet.toml",
        );
        info!("Using testnet configuration");
    }

    // Load configuration from config file (or HTLC_COORDINATOR_CONFIG_PATH env var)
    let config = Arc::new(Config::load()?);
    info!("Configuration loaded successfully");

    let ledger_timeout = Duration::from_millis(config.coordinator.ledger_timeout_ms);

    // Build the ledger adapters
    let evm: Arc<dyn LedgerAdapter> =
        Arc::new(EvmLedgerAdapter::new(&config.evm_chain, ledger_timeout)?);
    let stellar: Arc<dyn LedgerAdapter> =
        Arc::new(StellarLedgerAdapter::new(&config.stellar_chain, ledger_timeout)?);
    info!(
        evm = %config.evm_chain.name,
        stellar = %config.stellar_chain.name,
        "Ledger adapters initialized"
    );

    // Build the coordinator over a fresh in-memory registry
    let coordinator = Arc::new(SwapCoordinator::new(
        config.clone(),
        evm,
        stellar,
        SwapRegistry::new(),
        Arc::new(SystemClock),
    ));

    // Spawn the background reconciliation poller
    let poller = ReconciliationPoller::new(
        coordinator.clone(),
        Duration::from_millis(config.coordinator.poll_interval_ms),
    );
    info!("Starting background reconciliation poller");
    tokio::spawn(async move {
        poller.run().await;
    });

    // Run the API server (this blocks until shutdown)
    let api_server = api::ApiServer::new(config, coordinator);
    api_server.run().await?;

    Ok(())
}

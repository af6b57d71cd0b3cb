//! API server, routes, and handlers
//!
//! This module contains the warp route tree, the standardized response
//! envelope, and the global rejection handler for the coordinator
//! service API.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::config::Config;
use crate::coordinator::SwapCoordinator;
use crate::error::{LedgerError, SwapError};
use crate::htlc::Preimage;
use crate::swap::{SwapFilter, SwapIntent};

// ============================================================================
// SHARED REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Standardized response structure for all API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error information (if failed)
    pub error: Option<ApiErrorBody>,
}

/// Machine-readable error kind plus human-readable detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Stable error kind for programmatic handling.
    pub kind: String,
    /// Human-readable description.
    pub detail: String,
}

/// Response payload for single-transaction protocol steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRefResponse {
    /// Swap the transaction belongs to.
    pub swap_id: String,
    /// Current authoritative swap status.
    pub status: String,
    /// Ledger transaction reference.
    pub tx_ref: String,
}

/// Response payload for swap completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteResponse {
    /// Swap the withdrawals belong to.
    pub swap_id: String,
    /// Current authoritative swap status.
    pub status: String,
    /// Source-side withdrawal reference.
    pub source_tx_ref: String,
    /// Destination-side withdrawal reference.
    pub dest_tx_ref: String,
}

/// Request body for swap completion. The preimage claim, when present,
/// is verified against on-chain state before it is trusted.
#[derive(Debug, Clone, Deserialize)]
struct CompleteSwapRequest {
    #[serde(default)]
    preimage: Option<String>,
}

// ============================================================================
// CUSTOM REJECTION TYPES
// ============================================================================

/// Custom rejection wrapping a coordinator error.
#[derive(Debug)]
struct SwapRejection(SwapError);

impl warp::reject::Reject for SwapRejection {}

/// Custom rejection for malformed request payloads.
#[derive(Debug)]
struct BadRequest(String);

impl warp::reject::Reject for BadRequest {}

fn reject_swap(err: SwapError) -> Rejection {
    warp::reject::custom(SwapRejection(err))
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a warp filter that injects the coordinator into handlers.
fn with_coordinator(
    coordinator: Arc<SwapCoordinator>,
) -> impl Filter<Extract = (Arc<SwapCoordinator>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || coordinator.clone())
}

fn ok_response<T: Serialize>(data: T) -> impl Reply {
    warp::reply::json(&ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn initiate_swap_handler(
    intent: SwapIntent,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    debug!(?intent, "POST /swaps");
    let swap = coordinator.initiate_swap(intent).await.map_err(reject_swap)?;
    Ok(ok_response(swap))
}

async fn create_source_htlc_handler(
    swap_id: String,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let tx_ref = coordinator
        .create_source_htlc(&swap_id)
        .await
        .map_err(reject_swap)?;
    let swap = coordinator.get_swap(&swap_id).await.map_err(reject_swap)?;
    Ok(ok_response(TxRefResponse {
        swap_id,
        status: swap.status.to_string(),
        tx_ref,
    }))
}

async fn create_destination_htlc_handler(
    swap_id: String,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let tx_ref = coordinator
        .create_destination_htlc(&swap_id)
        .await
        .map_err(reject_swap)?;
    let swap = coordinator.get_swap(&swap_id).await.map_err(reject_swap)?;
    Ok(ok_response(TxRefResponse {
        swap_id,
        status: swap.status.to_string(),
        tx_ref,
    }))
}

async fn complete_swap_handler(
    swap_id: String,
    request: CompleteSwapRequest,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let claimed = match request.preimage {
        Some(raw) => Some(
            Preimage::from_hex(&raw)
                .map_err(|e| warp::reject::custom(BadRequest(format!("invalid preimage: {}", e))))?,
        ),
        None => None,
    };
    let (source_tx_ref, dest_tx_ref) = coordinator
        .complete_swap(&swap_id, claimed)
        .await
        .map_err(reject_swap)?;
    let swap = coordinator.get_swap(&swap_id).await.map_err(reject_swap)?;
    Ok(ok_response(CompleteResponse {
        swap_id,
        status: swap.status.to_string(),
        source_tx_ref,
        dest_tx_ref,
    }))
}

async fn refund_swap_handler(
    swap_id: String,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let tx_ref = coordinator
        .refund_swap(&swap_id)
        .await
        .map_err(reject_swap)?;
    let swap = coordinator.get_swap(&swap_id).await.map_err(reject_swap)?;
    Ok(ok_response(TxRefResponse {
        swap_id,
        status: swap.status.to_string(),
        tx_ref,
    }))
}

async fn get_swap_handler(
    swap_id: String,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let swap = coordinator.get_swap(&swap_id).await.map_err(reject_swap)?;
    Ok(ok_response(swap))
}

async fn list_swaps_handler(
    filter: SwapFilter,
    coordinator: Arc<SwapCoordinator>,
) -> Result<impl Reply, Rejection> {
    let swaps = coordinator.list_swaps(&filter).await;
    Ok(ok_response(swaps))
}

async fn health_handler(coordinator: Arc<SwapCoordinator>) -> Result<impl Reply, Rejection> {
    Ok(ok_response(coordinator.health().await))
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Creates a CORS filter based on the configured allowed origins.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![Method::GET, Method::POST, Method::OPTIONS];

    if allowed_origins.contains(&"*".to_string()) {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Maps a coordinator error to the HTTP status for its taxonomy class.
fn status_for(err: &SwapError) -> StatusCode {
    if err.is_validation() {
        return StatusCode::BAD_REQUEST;
    }
    match err {
        SwapError::SwapNotFound(_) => StatusCode::NOT_FOUND,
        SwapError::InvalidState { .. } | SwapError::StaleState { .. } => StatusCode::CONFLICT,
        SwapError::Ledger(LedgerError::Unreachable(_)) => StatusCode::BAD_GATEWAY,
        SwapError::Ledger(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Global rejection handler for all API routes.
///
/// Converts rejections into the standardized envelope with the
/// machine-readable error kind and appropriate HTTP status.
async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, kind, detail) = if let Some(SwapRejection(err)) = rej.find::<SwapRejection>() {
        (status_for(err), err.kind().to_string(), err.to_string())
    } else if let Some(BadRequest(detail)) = rej.find::<BadRequest>() {
        (StatusCode::BAD_REQUEST, "bad_request".to_string(), detail.clone())
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            "bad_request".to_string(),
            format!("Invalid JSON: {}", err),
        )
    } else if rej.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "not_found".to_string(),
            "Endpoint not found".to_string(),
        )
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed".to_string(),
            "Method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal".to_string(),
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiErrorBody { kind, detail }),
        }),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the coordinator service.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// The swap coordinator all handlers delegate to
    coordinator: Arc<SwapCoordinator>,
}

impl ApiServer {
    /// Creates a new API server over the coordinator.
    pub fn new(config: Arc<Config>, coordinator: Arc<SwapCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Starts the API server and begins handling HTTP requests.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.api.host, self.config.api.port)
                .parse()
                .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let coordinator = self.coordinator.clone();

        // Health check endpoint - coordinator + adapter statuses
        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_coordinator(coordinator.clone()))
            .and_then(health_handler);

        // POST /swaps - initiate a swap
        let initiate = warp::path("swaps")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(with_coordinator(coordinator.clone()))
            .and_then(initiate_swap_handler);

        // POST /swaps/:id/source-htlc - lock the source side
        let source_htlc = warp::path("swaps")
            .and(warp::path::param())
            .and(warp::path("source-htlc"))
            .and(warp::path::end())
            .and(warp::post())
            .and(with_coordinator(coordinator.clone()))
            .and_then(create_source_htlc_handler);

        // POST /swaps/:id/destination-htlc - lock the destination side
        let destination_htlc = warp::path("swaps")
            .and(warp::path::param())
            .and(warp::path("destination-htlc"))
            .and(warp::path::end())
            .and(warp::post())
            .and(with_coordinator(coordinator.clone()))
            .and_then(create_destination_htlc_handler);

        // POST /swaps/:id/complete - reveal and settle both sides
        let complete = warp::path("swaps")
            .and(warp::path::param())
            .and(warp::path("complete"))
            .and(warp::path::end())
            .and(warp::post())
            .and(
                warp::body::json()
                    .or(warp::any().map(|| CompleteSwapRequest { preimage: None }))
                    .unify(),
            )
            .and(with_coordinator(coordinator.clone()))
            .and_then(complete_swap_handler);

        // POST /swaps/:id/refund - refund expired locks
        let refund = warp::path("swaps")
            .and(warp::path::param())
            .and(warp::path("refund"))
            .and(warp::path::end())
            .and(warp::post())
            .and(with_coordinator(coordinator.clone()))
            .and_then(refund_swap_handler);

        // GET /swaps/:id - read one swap
        let get_swap = warp::path("swaps")
            .and(warp::path::param())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_coordinator(coordinator.clone()))
            .and_then(get_swap_handler);

        // GET /swaps?status=...&source_chain=... - filtered listing
        let list_swaps = warp::path("swaps")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<SwapFilter>())
            .and(with_coordinator(coordinator.clone()))
            .and_then(list_swaps_handler);

        health
            .or(initiate)
            .or(source_htlc)
            .or(destination_htlc)
            .or(complete)
            .or(refund)
            .or(get_swap)
            .or(list_swaps)
            .with(create_cors_filter(&self.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}

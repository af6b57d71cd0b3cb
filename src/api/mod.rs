//! REST API Server Module
//!
//! This module provides the REST API for the coordinator service:
//! swap initiation, the lock/complete/refund protocol steps, and
//! read-only status queries. The API is a thin transport layer; all
//! protocol logic lives in the coordinator.

mod server;

// Re-export ApiServer for convenience
pub use server::ApiServer;
// Re-export response types for testing
#[allow(unused_imports)]
pub use server::{ApiErrorBody, ApiResponse, CompleteResponse, TxRefResponse};

//! HTTP API Layer
//!
//! Trigger endpoint (`/`) plus operator endpoints for the queue and the
//! domain registry.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{build_router, ApiServer, ApiServerConfig, AppState};

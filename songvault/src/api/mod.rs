//! REST API server module.
//!
//! HTTP endpoints for extracting, ingesting, listing and delivering songs.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};

//! songvault library crate.
//!
//! Ingests the audio track of online videos into a SQLite-backed song library
//! and serves it back as a byte stream or a base64 envelope.

pub mod api;
pub mod config;
pub mod database;
pub mod delivery;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod library;
pub mod logging;
pub mod resolver;

pub use error::{Error, Result};

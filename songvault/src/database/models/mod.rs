//! Database models for songvault.
//!
//! These models map directly to the database schema.

pub mod track;

pub use track::*;

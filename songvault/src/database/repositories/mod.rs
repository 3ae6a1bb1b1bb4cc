//! Repository layer for database access.
//!
//! Repositories hide SQL behind traits so services can be tested against
//! alternative stores.

pub mod track;

pub use track::*;

//! renamer-core
//!
//! Core library for restoring the canonical file names of Windows modules.
//!
//! This crate defines the data model, the PE inspector, name resolution and
//! similarity scoring, the tree walker and ranker, and the rename executor.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends; the CLI only parses flags and prints.

pub mod config;
pub mod model;
pub mod services;
pub mod util;

pub use config::RunConfig;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

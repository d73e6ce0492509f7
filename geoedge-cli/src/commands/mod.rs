//! CLI command implementations.
//!
//! - [`composite`] - Build a composite and print its tile response
//! - [`config`] - Configuration management (init, path, show)

pub mod composite;
pub mod config;

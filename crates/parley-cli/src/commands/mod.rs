//! CLI command implementations.

pub mod config;
pub mod estimate;
pub mod serve;

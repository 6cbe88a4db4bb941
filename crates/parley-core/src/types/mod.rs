//! Core types for Parley.

mod identifiers;
mod message;

pub use identifiers::*;
pub use message::*;

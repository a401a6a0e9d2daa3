//! vistagram/crates/domains/src/lib.rs
//!
//! The post aggregate, pagination rules and port definitions for the
//! Vistagram feed core. No I/O happens in this crate.

pub mod error;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod time_ago;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;

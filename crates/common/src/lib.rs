//! livecap Common Utilities
//!
//! Shared infrastructure for all livecap crates:
//! - Error taxonomy and result aliases
//! - Wall-clock timestamps that never step backwards
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

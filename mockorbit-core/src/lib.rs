//! Mock Orbit Core - shared domain types and ambient infrastructure
//!
//! Defines the account and role records exchanged with the authentication service,
//! together with the error, logging and configuration layers used by every other crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;

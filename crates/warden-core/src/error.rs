//! Error types for warden-core.
//!
//! Combinators never surface errors to callers; every internal condition
//! becomes a well-formed envelope. The error type exists for construction
//! paths only.

use thiserror::Error;

/// Core error type for warden setup.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration rejected during facade construction.
    #[error("Configuration error: {0}")]
    Config(String),
}

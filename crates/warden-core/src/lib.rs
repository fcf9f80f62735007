//! # Warden Core
//!
//! Trust envelopes, wrapping combinators, and rate limiting for MCP tool
//! results. This crate is the composition layer of mcp-warden: it decides how
//! much a payload can be trusted and guards tool invocations, delegating all
//! text inspection to `warden-sanitize`.
//!
//! ## Threat Coverage
//!
//! | Layer | Component | Threats Addressed |
//! |-------|-----------|-------------------|
//! | Provenance | Envelope + trust lattice | Over-trusting external data |
//! | Content | Sanitize combinator | Injection, jailbreak, hidden encodings |
//! | Invocation | Validate + rate-limit combinators | Bad inputs, abuse |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WARDEN CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   args ──▶ RateLimited ──▶ Sanitized ──▶ MarkUntrusted      │
//! │                │               │               │            │
//! │                │               │               ▼            │
//! │                │               │          inner ToolOp      │
//! │                │               ▼                            │
//! │                │        trust lattice                       │
//! │                ▼        (downgrade only)                    │
//! │          RateLimiter                                        │
//! │       (per-tool windows)            ──▶ Envelope            │
//! │                                         {data, trust,       │
//! │                                          warnings}          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Notes
//!
//! - Trust is monotonic: outer combinators only add warnings or downgrade.
//! - Every pre-invocation rejection is a well-formed envelope, never an
//!   error; callers do not need to catch anything from this crate.
//! - The rate-limit registry is the only shared mutable state; each tool
//!   identity has its own lock.

mod config;
mod envelope;
mod error;
mod rate;
mod trust;
mod warden;
mod wrap;

pub use config::{RateLimitConfig, SanitizerConfig, WardenConfig};
pub use envelope::{Envelope, ToolResult, DEFAULT_UNTRUSTED_WARNING};
pub use error::WardenError;
pub use rate::RateLimiter;
pub use trust::TrustLevel;
pub use warden::Warden;
pub use wrap::{
    tool_fn, MarkTrusted, MarkUntrusted, RateLimited, Sanitized, ToolFn, ToolOp, ToolOpExt,
    ValidateInputs, WARNING_INPUT_VALIDATION_FAILED, WARNING_SANITIZATION_SKIPPED,
};

// Re-export the pipeline surface for convenience
pub use warden_sanitize::{BasicSanitizer, PatternCatalog, Sanitize, SanitizerChain};

/// Core result type for warden setup operations.
pub type Result<T> = std::result::Result<T, WardenError>;

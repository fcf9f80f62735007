//! # Warden Sanitize - Detection and Filtering Pipeline
//!
//! The text-inspection layer of mcp-warden. This crate owns everything that
//! looks at untrusted content: the static detection catalog, Unicode
//! canonicalization, and the ordered sanitization pipeline that neutralizes
//! prompt-injection, jailbreak, and hidden-encoding payloads before they
//! reach a model-facing consumer.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SANITIZATION PIPELINE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌───────────┐  ┌─────────┐  ┌───────────┐  ┌───────────┐   │
//! │  │ NORMALIZE │→ │  SCRUB  │→ │ INJECTION │→ │ JAILBREAK │   │
//! │  │ NFKC +    │  │ control │  │ filtering │  │ filtering │   │
//! │  │ confusab. │  │ chars   │  │           │  │           │   │
//! │  └───────────┘  └─────────┘  └───────────┘  └─────┬─────┘   │
//! │                                                   │         │
//! │                                           ┌───────▼──────┐  │
//! │                                           │   ENCODING   │  │
//! │                                           │  detection   │  │
//! │                                           │ (warn/filter)│  │
//! │                                           └──────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Output is always `(sanitized_payload, warnings)`. The pipeline never
//! raises, never decodes suspicious spans, and never decides trust; the
//! trust lattice in `warden-core` maps warnings to trust levels.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::Value;
//! use warden_sanitize::{BasicSanitizer, Sanitize};
//!
//! let sanitizer = BasicSanitizer::new();
//! let (clean, warnings) = sanitizer.sanitize(&Value::String("hello".into()));
//! assert_eq!(clean, Value::String("hello".into()));
//! assert!(warnings.is_empty());
//! ```

pub mod normalize;
pub mod patterns;
pub mod pipeline;

pub use normalize::normalize_text;
pub use patterns::{DetectionRule, PatternCatalog, RuleCategory, FILTERED_PLACEHOLDER};
pub use pipeline::{
    contains_control_characters, scrub_control_characters, BasicSanitizer, Sanitize,
    SanitizerChain,
};

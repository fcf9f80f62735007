//! # Wrapping Combinators
//!
//! Composable behaviors stacked around a tool call: trust marking,
//! sanitization, input validation, and rate limiting. Each combinator wraps
//! an inner [`ToolOp`] and is itself a [`ToolOp`], so stacks compose by
//! ordinary construction with no combinator knowing about the others.
//!
//! ## Composition contract
//!
//! A combinator receiving an already-constructed envelope from an inner layer
//! must either pass it through unchanged or derive its own envelope strictly
//! from the inner envelope's `data`/`warnings`/`trust_level`. Inner-layer
//! information is never discarded, outer layers only add warnings or
//! downgrade trust, and no layer can invent more trust than the sanitization
//! evidence supports. The innermost combinator establishes provenance.
//!
//! Every pre-invocation rejection (validation, rate limit) surfaces as a
//! well-formed rejection envelope, never an error; exceptions raised by the
//! wrapped operation itself are the host's concern.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use warden_sanitize::{BasicSanitizer, Sanitize};

use crate::envelope::{Envelope, ToolResult};
use crate::rate::RateLimiter;
use crate::trust::TrustLevel;

/// Warning recorded when a caller explicitly opts out of sanitization.
pub const WARNING_SANITIZATION_SKIPPED: &str = "Sanitization explicitly skipped.";

/// Warning carried by the rejection envelope of a failed input validation.
pub const WARNING_INPUT_VALIDATION_FAILED: &str = "Input validation failed";

/// An asynchronous tool operation.
///
/// Implementations return either a bare payload or an envelope an inner
/// combinator already built; combinators accept both.
#[async_trait]
pub trait ToolOp: Send + Sync {
    async fn call(&self, args: &Value) -> ToolResult;
}

#[async_trait]
impl<'a, T: ToolOp + ?Sized> ToolOp for &'a T {
    async fn call(&self, args: &Value) -> ToolResult {
        (**self).call(args).await
    }
}

#[async_trait]
impl<T: ToolOp + ?Sized> ToolOp for Box<T> {
    async fn call(&self, args: &Value) -> ToolResult {
        (**self).call(args).await
    }
}

#[async_trait]
impl<T: ToolOp + ?Sized> ToolOp for Arc<T> {
    async fn call(&self, args: &Value) -> ToolResult {
        (**self).call(args).await
    }
}

/// Adapt an async closure into a [`ToolOp`].
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Value};
/// use warden_core::{tool_fn, ToolOp, ToolResult};
///
/// # tokio_test::block_on(async {
/// let echo = tool_fn(|args: Value| async move { ToolResult::Raw(args) });
/// let result = echo.call(&json!("hi")).await;
/// assert_eq!(result, ToolResult::Raw(json!("hi")));
/// # });
/// ```
pub fn tool_fn<F, Fut>(f: F) -> ToolFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ToolResult> + Send,
{
    ToolFn { f }
}

/// See [`tool_fn`].
pub struct ToolFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolOp for ToolFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ToolResult> + Send,
{
    async fn call(&self, args: &Value) -> ToolResult {
        (self.f)(args.clone()).await
    }
}

/// Mark results from a developer-verified source as trusted.
///
/// An inner envelope passes through unchanged; only bare payloads are
/// wrapped, so an outer `MarkTrusted` can never launder an inner judgment.
pub struct MarkTrusted<T> {
    inner: T,
}

impl<T> MarkTrusted<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ToolOp> ToolOp for MarkTrusted<T> {
    async fn call(&self, args: &Value) -> ToolResult {
        match self.inner.call(args).await {
            ToolResult::Secured(envelope) => ToolResult::Secured(envelope),
            ToolResult::Raw(data) => ToolResult::Secured(Envelope::trusted(data)),
        }
    }
}

/// Mark results from an unverified external source as untrusted.
pub struct MarkUntrusted<T> {
    inner: T,
}

impl<T> MarkUntrusted<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ToolOp> ToolOp for MarkUntrusted<T> {
    async fn call(&self, args: &Value) -> ToolResult {
        match self.inner.call(args).await {
            ToolResult::Secured(envelope) => ToolResult::Secured(envelope),
            ToolResult::Raw(data) => ToolResult::Secured(Envelope::untrusted(data)),
        }
    }
}

/// Run the inner result's payload through a sanitizer and downgrade trust
/// according to what the sanitizer found.
///
/// A bare payload from the inner operation starts at `Untrusted`: an
/// un-annotated result gets the least trust by default. An inner envelope
/// contributes its data, warnings, and prior trust, all of which survive into
/// the derived envelope.
pub struct Sanitized<T, S = BasicSanitizer> {
    inner: T,
    sanitizer: Option<S>,
}

impl<T> Sanitized<T, BasicSanitizer> {
    /// Sanitize with the default pipeline.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            sanitizer: Some(BasicSanitizer::new()),
        }
    }

    /// Explicitly opt out of sanitization. The result keeps its prior trust
    /// but carries [`WARNING_SANITIZATION_SKIPPED`] so the opt-out is visible
    /// to the consumer.
    pub fn skipped(inner: T) -> Self {
        Self {
            inner,
            sanitizer: None,
        }
    }
}

impl<T, S: Sanitize> Sanitized<T, S> {
    /// Sanitize with a caller-supplied sanitizer.
    pub fn with_sanitizer(inner: T, sanitizer: S) -> Self {
        Self {
            inner,
            sanitizer: Some(sanitizer),
        }
    }
}

#[async_trait]
impl<T: ToolOp, S: Sanitize> ToolOp for Sanitized<T, S> {
    async fn call(&self, args: &Value) -> ToolResult {
        let (data, mut warnings, prior_trust) = match self.inner.call(args).await {
            ToolResult::Secured(envelope) => {
                (envelope.data, envelope.warnings, envelope.trust_level)
            }
            ToolResult::Raw(data) => (data, Vec::new(), TrustLevel::Untrusted),
        };

        match &self.sanitizer {
            Some(sanitizer) => {
                let (clean, new_warnings) = sanitizer.sanitize(&data);
                let trust_level = prior_trust.downgrade(&new_warnings);
                if !new_warnings.is_empty() {
                    debug!(
                        from = ?prior_trust,
                        to = ?trust_level,
                        count = new_warnings.len(),
                        "sanitizer flagged content"
                    );
                }
                warnings.extend(new_warnings);
                ToolResult::Secured(Envelope::new(clean, trust_level, warnings))
            }
            None => {
                warnings.push(WARNING_SANITIZATION_SKIPPED.to_string());
                ToolResult::Secured(Envelope::new(data, prior_trust, warnings))
            }
        }
    }
}

/// Validate call arguments before the wrapped operation runs.
///
/// On failure the wrapped operation is never invoked (no side effects occur)
/// and the caller receives a rejection envelope.
pub struct ValidateInputs<T, V> {
    inner: T,
    validator: V,
}

impl<T, V> ValidateInputs<T, V>
where
    V: Fn(&Value) -> bool + Send + Sync,
{
    pub fn new(inner: T, validator: V) -> Self {
        Self { inner, validator }
    }
}

#[async_trait]
impl<T, V> ToolOp for ValidateInputs<T, V>
where
    T: ToolOp,
    V: Fn(&Value) -> bool + Send + Sync,
{
    async fn call(&self, args: &Value) -> ToolResult {
        if !(self.validator)(args) {
            warn!("input validation failed; wrapped operation not invoked");
            return ToolResult::Secured(Envelope::rejected(WARNING_INPUT_VALIDATION_FAILED));
        }

        match self.inner.call(args).await {
            // Exact identity for inner envelopes, not a reconstruction.
            ToolResult::Secured(envelope) => ToolResult::Secured(envelope),
            ToolResult::Raw(data) => ToolResult::Secured(Envelope::untrusted(data)),
        }
    }
}

/// Reject calls that exceed a per-tool sliding-window budget.
///
/// Admitted calls pass the inner result through untouched; marking trust is
/// an inner combinator's job.
pub struct RateLimited<T> {
    inner: T,
    limiter: Arc<RateLimiter>,
    tool_id: String,
    max_calls: usize,
    period: Duration,
}

impl<T> RateLimited<T> {
    pub fn new(
        inner: T,
        limiter: Arc<RateLimiter>,
        tool_id: impl Into<String>,
        max_calls: usize,
        period: Duration,
    ) -> Self {
        Self {
            inner,
            limiter,
            tool_id: tool_id.into(),
            max_calls,
            period,
        }
    }
}

#[async_trait]
impl<T: ToolOp> ToolOp for RateLimited<T> {
    async fn call(&self, args: &Value) -> ToolResult {
        if !self
            .limiter
            .try_acquire(&self.tool_id, self.max_calls, self.period)
        {
            return ToolResult::Secured(Envelope::rejected(format!(
                "Rate limit exceeded: {} calls per {} seconds",
                self.max_calls,
                self.period.as_secs()
            )));
        }

        self.inner.call(args).await
    }
}

/// Fluent stacking of combinators, innermost first.
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use serde_json::{json, Value};
/// use warden_core::{tool_fn, RateLimiter, ToolOp, ToolOpExt, ToolResult};
///
/// # tokio_test::block_on(async {
/// let limiter = Arc::new(RateLimiter::new());
/// let op = tool_fn(|_: Value| async move { ToolResult::Raw(json!("fetched page")) })
///     .mark_untrusted()
///     .sanitized()
///     .rate_limited(limiter, "web.fetch", 10, Duration::from_secs(60));
///
/// let envelope = op.call(&json!({})).await.into_envelope();
/// assert!(envelope.trust_level.is_untrusted());
/// # });
/// ```
pub trait ToolOpExt: ToolOp + Sized {
    fn mark_trusted(self) -> MarkTrusted<Self> {
        MarkTrusted::new(self)
    }

    fn mark_untrusted(self) -> MarkUntrusted<Self> {
        MarkUntrusted::new(self)
    }

    fn sanitized(self) -> Sanitized<Self> {
        Sanitized::new(self)
    }

    fn sanitized_with<S: Sanitize>(self, sanitizer: S) -> Sanitized<Self, S> {
        Sanitized::with_sanitizer(self, sanitizer)
    }

    fn sanitization_skipped(self) -> Sanitized<Self> {
        Sanitized::skipped(self)
    }

    fn validated<V>(self, validator: V) -> ValidateInputs<Self, V>
    where
        V: Fn(&Value) -> bool + Send + Sync,
    {
        ValidateInputs::new(self, validator)
    }

    fn rate_limited(
        self,
        limiter: Arc<RateLimiter>,
        tool_id: impl Into<String>,
        max_calls: usize,
        period: Duration,
    ) -> RateLimited<Self> {
        RateLimited::new(self, limiter, tool_id, max_calls, period)
    }
}

impl<T: ToolOp> ToolOpExt for T {}

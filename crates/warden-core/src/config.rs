//! Configuration types for mcp-warden.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`Warden`](crate::Warden) facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Sanitization pipeline settings.
    pub sanitizer: SanitizerConfig,

    /// Rate limiting defaults applied by the standard stack.
    pub rate_limit: RateLimitConfig,
}

/// Sanitization pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Replace detected encoding spans instead of only warning about them.
    pub filter_encodings: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            filter_encodings: false,
        }
    }
}

/// Sliding-window rate limit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum calls per tool identity within the period.
    pub max_calls: usize,

    /// Window length in seconds.
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 10,
            period_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// The window length as a [`Duration`].
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert!(!config.sanitizer.filter_encodings);
        assert_eq!(config.rate_limit.max_calls, 10);
        assert_eq!(config.rate_limit.period(), Duration::from_secs(60));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = WardenConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: WardenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rate_limit.max_calls, config.rate_limit.max_calls);
        assert_eq!(back.sanitizer.filter_encodings, config.sanitizer.filter_encodings);
    }
}

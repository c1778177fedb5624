//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cache-control policy applied to GET/HEAD responses.
    pub cache: CacheConfig,

    /// Upstream client settings.
    pub upstream: UpstreamConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin headers.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Cache bounds for the `Cache-control` header.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// max-age used when the caller supplies no usable `cacheMaxAge`.
    pub default_max_age_secs: u64,

    /// Floor applied to every max-age unless caching is disabled.
    pub min_max_age_secs: u64,

    /// `stale-if-error` directive value.
    pub stale_if_error_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_max_age_secs: 60 * 60,
            min_max_age_secs: 5 * 60,
            stale_if_error_secs: 600,
        }
    }
}

impl CacheConfig {
    /// Resolve the max-age for a request.
    ///
    /// A zero or absent override falls back to the default; the result is
    /// never below the floor unless `disable_cache` is set.
    pub fn max_age(&self, disable_cache: bool, override_secs: Option<i64>) -> u64 {
        if disable_cache {
            return 0;
        }

        let requested = match override_secs {
            Some(secs) if secs != 0 => secs,
            _ => i64::try_from(self.default_max_age_secs).unwrap_or(i64::MAX),
        };

        // Negative overrides clamp to the floor as well.
        u64::try_from(requested)
            .unwrap_or(0)
            .max(self.min_max_age_secs)
    }

    /// Render the full `Cache-control` header value.
    pub fn header_value(&self, disable_cache: bool, override_secs: Option<i64>) -> String {
        format!(
            "public, max-age={}, stale-if-error={}",
            self.max_age(disable_cache, override_secs),
            self.stale_if_error_secs
        )
    }
}

/// Upstream HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total upstream request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum redirects followed before failing.
    pub max_redirects: usize,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// Largest upstream body buffered, after decompression.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_redirects: 10,
            user_agent: concat!("origin-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Attach permissive `Access-Control-Allow-*` headers.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit newline-delimited JSON instead of the pretty format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

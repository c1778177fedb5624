//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, cache bounds ordered)
//! - Validate the bind address parses as a socket address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("cache.min_max_age_secs ({min}) exceeds cache.default_max_age_secs ({default})")]
    CacheBounds { min: u64, default: u64 },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({inbound}) must exceed upstream.request_timeout_secs ({upstream})")]
    InboundTimeout { inbound: u64, upstream: u64 },

    #[error("upstream.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("upstream.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let cache = &config.cache;
    if cache.min_max_age_secs > cache.default_max_age_secs {
        errors.push(ValidationError::CacheBounds {
            min: cache.min_max_age_secs,
            default: cache.default_max_age_secs,
        });
    }

    let upstream = &config.upstream;
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }
    if upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.request_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    } else if config.timeouts.request_secs <= upstream.request_timeout_secs {
        errors.push(ValidationError::InboundTimeout {
            inbound: config.timeouts.request_secs,
            upstream: upstream.request_timeout_secs,
        });
    }

    if upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }
    if upstream.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

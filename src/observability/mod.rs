//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler and fetchers produce:
//!     → logging.rs (structured log events with request_id, mode, url)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//! ```

pub mod logging;

pub use logging::init_logging;

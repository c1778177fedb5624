//! Stateless HTTP relay.
//!
//! Fetches a caller-supplied URL and returns it as JSON contents, upstream
//! metadata, or the raw bytes, with cache and CORS headers attached.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

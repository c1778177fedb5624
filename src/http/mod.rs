//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handler)
//!     → request.rs (request ID, Params from method/path/query)
//!     → [relay dispatches and fetches upstream]
//!     → response.rs (cache headers, raw bytes or JSON/JSONP)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, Params, RequestMethod, X_REQUEST_ID};
pub use response::ResponseBuilder;
pub use server::HttpServer;

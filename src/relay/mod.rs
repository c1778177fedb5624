//! Relay core: dispatch, upstream fetch and failure normalization.
//!
//! # Data Flow
//! ```text
//! Params (http/request.rs)
//!     → dispatch.rs (format + method → Mode)
//!     → fetch.rs (one fetcher, exactly one upstream call)
//!         → upstream.rs (reqwest, charset decoding)
//!         → on failure: error.rs (normalize → ErrorPage)
//!     → Page (page.rs)
//!     → http/response.rs
//! ```
//!
//! # Design Decisions
//! - Mode is a closed enum resolved once; it never changes after dispatch
//! - Fetchers never return errors, only pages
//! - No state is shared between requests apart from the pooled client

pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod page;
pub mod upstream;

pub use dispatch::{select_mode, Mode};
pub use error::{TransportError, TransportErrorKind, UpstreamError};
pub use fetch::{ContentsFetcher, Fetcher, InfoFetcher, RawFetcher};
pub use page::{ContentPage, ContentStatus, ErrorPage, ErrorStatus, InfoPage, Page, RawPage};
pub use upstream::{HttpUpstream, Upstream, UpstreamRequest, UpstreamResponse};

use crate::http::request::Params;

/// Dispatches a request to the fetcher for its mode.
#[derive(Debug, Clone)]
pub struct Relay<U> {
    upstream: U,
}

impl<U: Upstream> Relay<U> {
    pub fn new(upstream: U) -> Self {
        Self { upstream }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Run the fetcher selected by `mode`.
    pub async fn fetch(&self, mode: Mode, params: &Params) -> Page {
        match mode {
            Mode::Info => InfoFetcher::new(&self.upstream).fetch(params).await,
            Mode::Raw => RawFetcher::new(&self.upstream).fetch(params).await,
            Mode::Contents => ContentsFetcher::new(&self.upstream).fetch(params).await,
        }
    }
}

//! Request interpretation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Derive the immutable relay parameters from method, path and query
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Parsing never fails; a missing `url` is left for the upstream call to reject
//! - The first occurrence of a repeated query parameter wins

use std::fmt;

use axum::http::{HeaderName, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::form_urlencoded;
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs for the tower-http request-id layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}

/// Methods the relay distinguishes. Anything else is treated as GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl RequestMethod {
    /// Case-insensitive parse; unrecognized methods normalize to GET.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "OPTIONS" => Self::Options,
            _ => Self::Get,
        }
    }

    /// Whether responses to this method carry a `Cache-control` header.
    pub fn is_cacheable(self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }

    pub fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Head => Method::HEAD,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
            Self::Patch => Method::PATCH,
            Self::Options => Method::OPTIONS,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// Parameters derived once per inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pub request_method: RequestMethod,
    /// Lowercased first path segment, `"json"` when empty.
    pub format: String,
    pub url: Option<String>,
    pub charset: Option<String>,
    pub callback: Option<String>,
    pub disable_cache: bool,
    /// Raw `cacheMaxAge` override; `None` when absent or not an integer.
    pub cache_max_age: Option<i64>,
}

impl Params {
    /// Derive parameters from the inbound method and URI.
    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        let format = uri
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "json".to_string());

        let mut params = Params {
            request_method: RequestMethod::parse(method.as_str()),
            format,
            ..Params::default()
        };

        let mut disable_cache_seen = false;
        let query = uri.query().unwrap_or_default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "url" if params.url.is_none() => params.url = Some(value.into_owned()),
                "charset" if params.charset.is_none() => {
                    params.charset = non_empty(value.as_ref());
                }
                "callback" if params.callback.is_none() => {
                    params.callback = non_empty(value.as_ref());
                }
                "disableCache" if !disable_cache_seen => {
                    disable_cache_seen = true;
                    params.disable_cache = !value.is_empty();
                }
                "cacheMaxAge" if params.cache_max_age.is_none() => {
                    params.cache_max_age = parse_max_age(value.as_ref());
                }
                _ => {}
            }
        }

        params
    }

    pub fn is_raw(&self) -> bool {
        self.format == "raw"
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Integer seconds; fractional values truncate toward zero.
fn parse_max_age(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.trunc() as i64)
    })
}

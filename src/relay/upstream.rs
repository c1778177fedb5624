//! Upstream HTTP collaborator.
//!
//! # Responsibilities
//! - Issue exactly one upstream request per relay fetch
//! - Toggle transparent decompression per request
//! - Decode the body from a declared charset when the label is known
//! - Classify failures as transport-level or status-level
//!
//! # Design Decisions
//! - Two pooled reqwest clients (decoding and non-decoding) built once
//! - HEAD always goes through the non-decoding client so `Content-Length`
//!   reflects what the upstream sent
//! - Status >= 400 is a failure, matching `reqwest::Response::error_for_status`
//! - Unknown charsets are ignored, never an error
//! - Bodies are buffered up to `upstream.max_body_bytes`; larger ones fail

use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use encoding_rs::Encoding;
use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;
use crate::relay::error::{TransportError, TransportErrorKind, UpstreamError};

/// A single upstream call as requested by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Caller-supplied target; not validated before the call.
    pub url: Option<String>,
    pub method: Method,
    /// Transparently decode gzip/brotli/deflate bodies.
    pub decompress: bool,
    /// Charset label the body should be decoded from.
    pub charset: Option<String>,
}

/// A settled upstream response with its body fully read.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Header value as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Capability to reach the upstream resource.
pub trait Upstream: Send + Sync {
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}

/// reqwest-backed upstream client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    decoding: reqwest::Client,
    passthrough: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpUpstream {
    /// Build both clients from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            decoding: Self::builder(config).build()?,
            passthrough: Self::builder(config)
                .gzip(false)
                .brotli(false)
                .deflate(false)
                .build()?,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn builder(config: &UpstreamConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
    }

    fn client_for(&self, request: &UpstreamRequest) -> &reqwest::Client {
        if request.decompress && request.method != Method::HEAD {
            &self.decoding
        } else {
            &self.passthrough
        }
    }
}

impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url.as_deref().ok_or_else(|| {
            TransportError::new(TransportErrorKind::MissingUrl, "no url given")
        })?;
        let target = reqwest::Url::parse(url)
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidUrl, e.to_string()))?;

        let mut response = self
            .client_for(&request)
            .request(request.method.clone(), target)
            .send()
            .await
            .map_err(TransportError::from)?;

        let url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = if request.method == Method::HEAD {
            Bytes::new()
        } else {
            read_body(&mut response, self.max_body_bytes).await?
        };

        let response = UpstreamResponse {
            url,
            status: status.as_u16(),
            headers,
            body,
        };

        if status.is_client_error() || status.is_server_error() {
            return Err(UpstreamError::Status(response));
        }

        Ok(UpstreamResponse {
            body: decode_charset(response.body, request.charset.as_deref()),
            ..response
        })
    }
}

/// Buffer the response body, failing once it grows past `limit` bytes.
async fn read_body(
    response: &mut reqwest::Response,
    limit: usize,
) -> Result<Bytes, TransportError> {
    let too_large = || {
        TransportError::new(
            TransportErrorKind::Body,
            format!("upstream body exceeds {limit} bytes"),
        )
    };

    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(body))
}

/// Re-encode `body` from `charset` into UTF-8.
///
/// Returns the body untouched when no charset is given or the label is
/// unknown to `encoding_rs`.
pub fn decode_charset(body: Bytes, charset: Option<&str>) -> Bytes {
    let Some(encoding) = charset.and_then(|label| Encoding::for_label(label.trim().as_bytes()))
    else {
        return body;
    };

    let (decoded, _, _) = encoding.decode(&body);
    Bytes::from(decoded.into_owned())
}

//! Page values produced by the fetchers.
//!
//! A page lives for one request: a fetcher creates it, the response builder
//! consumes it.

use axum::body::Bytes;
use serde::Serialize;

use crate::relay::error::TransportError;

/// Result of one relay fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Page {
    Info(InfoPage),
    /// Sent as bytes, never JSON-encoded.
    #[serde(skip_serializing)]
    Raw(RawPage),
    Contents(ContentPage),
    Error(ErrorPage),
}

impl Page {
    /// Upstream status code, when one was received and kept.
    pub fn http_code(&self) -> Option<u16> {
        match self {
            Page::Info(info) => Some(info.http_code),
            Page::Contents(page) => Some(page.status.http_code),
            Page::Error(ErrorPage {
                status: ErrorStatus::Upstream { http_code, .. },
                ..
            }) => Some(*http_code),
            Page::Raw(_) | Page::Error(_) => None,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Page::Info(_) => "info",
            Page::Raw(_) => "raw",
            Page::Contents(_) => "contents",
            Page::Error(_) => "error",
        }
    }
}

/// Upstream metadata obtained from a HEAD probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoPage {
    pub url: String,
    /// `-1` when the upstream sent no usable `Content-Length`.
    pub content_length: i64,
    pub http_code: u16,
}

/// Upstream body returned verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub content: Bytes,
    /// Byte length of `content`.
    pub content_length: usize,
}

impl RawPage {
    pub fn new(content: Bytes) -> Self {
        let content_length = content.len();
        Self {
            content,
            content_length,
        }
    }
}

/// Decoded upstream body with its status block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPage {
    pub contents: String,
    pub status: ContentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentStatus {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub content_length: usize,
    pub http_code: u16,
}

/// Normalized failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPage {
    /// `None` when no upstream response was received.
    pub contents: Option<String>,
    pub status: ErrorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorStatus {
    /// The upstream call never produced a response.
    Transport { error: TransportError },
    /// The upstream answered with a failure status.
    Upstream {
        url: String,
        http_code: u16,
        content_length: usize,
    },
}

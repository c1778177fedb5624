//! Upstream failure types and their normalization into error pages.
//!
//! # Design Decisions
//! - "No response" and "response present" are distinct variants, never
//!   inferred from the shape of an untyped value
//! - `normalize` is the only place failures are interpreted; it never fails

use serde::Serialize;
use thiserror::Error;

use crate::relay::page::{ErrorPage, ErrorStatus, Page};
use crate::relay::upstream::UpstreamResponse;

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    MissingUrl,
    InvalidUrl,
    Connect,
    Timeout,
    Redirect,
    Body,
    Request,
}

/// The upstream call could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct TransportError {
    #[serde(rename = "code")]
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_redirect() {
            TransportErrorKind::Redirect
        } else if err.is_builder() {
            TransportErrorKind::InvalidUrl
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };

        // reqwest's Display omits the source chain; keep the root cause.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message = format!("{message}: {cause}");
            source = cause.source();
        }

        Self { kind, message }
    }
}

/// Errors returned by an [`Upstream`](crate::relay::upstream::Upstream).
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("upstream responded with status {}", .0.status)]
    Status(UpstreamResponse),
}

/// Convert any upstream failure into an error page.
pub fn normalize(err: UpstreamError) -> Page {
    match err {
        UpstreamError::Transport(error) => Page::Error(ErrorPage {
            contents: None,
            status: ErrorStatus::Transport { error },
        }),
        UpstreamError::Status(response) => {
            let content_length = response.body.len();
            Page::Error(ErrorPage {
                contents: Some(String::from_utf8_lossy(&response.body).into_owned()),
                status: ErrorStatus::Upstream {
                    url: response.url,
                    http_code: response.status,
                    content_length,
                },
            })
        }
    }
}

//! Response assembly.
//!
//! # Responsibilities
//! - Attach `Cache-control` to GET/HEAD responses
//! - Return raw upstream bytes for successful raw fetches
//! - JSON-encode every other page, injecting `response_time`
//! - Wrap JSON in a JSONP call when a callback is requested
//!
//! # Design Decisions
//! - The transport status is always 200; failures live in the JSON payload
//! - Cache bounds come from configuration, not constants
//! - Elapsed time is passed in by the caller

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};

use crate::config::CacheConfig;
use crate::http::request::Params;
use crate::relay::page::{Page, RawPage};

/// Builds the outgoing response for a page.
#[derive(Debug, Clone)]
pub struct ResponseBuilder<'a> {
    cache: &'a CacheConfig,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(cache: &'a CacheConfig) -> Self {
        Self { cache }
    }

    /// Assemble the response for `page`.
    pub fn build(&self, page: Page, params: &Params, elapsed: Duration) -> Response {
        let mut response = match page {
            Page::Raw(raw) if params.is_raw() => raw_response(raw),
            page => json_response(page, params, elapsed),
        };

        if params.request_method.is_cacheable() {
            let value = self
                .cache
                .header_value(params.disable_cache, params.cache_max_age);
            if let Ok(value) = HeaderValue::from_str(&value) {
                response.headers_mut().insert(header::CACHE_CONTROL, value);
            }
        }

        response
    }

    /// Empty response used for OPTIONS.
    pub fn empty() -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        response
    }
}

fn raw_response(raw: RawPage) -> Response {
    let mut response = Response::new(Body::from(raw.content));
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(raw.content_length));
    response
}

fn json_response(page: Page, params: &Params, elapsed: Duration) -> Response {
    let charset = params.charset.as_deref().unwrap_or("utf-8");
    let response_time = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    let mut payload = serde_json::to_value(&page).unwrap_or_else(|err| {
        tracing::error!(error = %err, kind = page.kind(), "Failed to encode page");
        json!({
            "contents": null,
            "status": { "error": { "code": "encode", "message": err.to_string() } },
        })
    });
    inject_response_time(&mut payload, response_time);

    let json = payload.to_string();
    let (content_type, body) = match params.callback.as_deref().and_then(sanitize_callback) {
        Some(callback) => (
            format!("text/javascript; charset={charset}"),
            jsonp(&callback, &json),
        ),
        None => (format!("application/json; charset={charset}"), json),
    };

    let mut response = Response::new(Body::from(Bytes::from(body)));
    let content_type = HeaderValue::from_str(&content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/json; charset=utf-8"));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

/// Put `response_time` into the status block when there is one.
fn inject_response_time(payload: &mut Value, response_time: u64) {
    let Some(object) = payload.as_object_mut() else {
        return;
    };
    match object.get_mut("status").and_then(Value::as_object_mut) {
        Some(status) => {
            status.insert("response_time".into(), response_time.into());
        }
        None => {
            object.insert("response_time".into(), response_time.into());
        }
    }
}

/// Keep only characters valid in a JS member expression.
fn sanitize_callback(callback: &str) -> Option<String> {
    let cleaned: String = callback
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '[' | ']'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn jsonp(callback: &str, json: &str) -> String {
    // U+2028/U+2029 are valid in JSON strings but terminate JS string literals.
    let json = json.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");
    format!("{callback}({json});")
}

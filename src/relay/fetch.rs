//! Per-mode fetchers.
//!
//! Each fetcher issues exactly one upstream call and always yields a
//! [`Page`]; upstream failures are normalized into [`Page::Error`] here and
//! never reach the caller as errors.

use std::future::Future;

use axum::http::{header, Method};

use crate::http::request::Params;
use crate::relay::error::{normalize, UpstreamError};
use crate::relay::page::{ContentPage, ContentStatus, InfoPage, Page, RawPage};
use crate::relay::upstream::{Upstream, UpstreamRequest};

/// Shared fetch contract.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, params: &Params) -> impl Future<Output = Page> + Send;
}

fn settle<T>(
    result: Result<T, UpstreamError>,
    url: Option<&str>,
    page: impl FnOnce(T) -> Page,
) -> Page {
    match result {
        Ok(value) => page(value),
        Err(err) => {
            tracing::warn!(url = url.unwrap_or_default(), error = %err, "Upstream fetch failed");
            normalize(err)
        }
    }
}

/// HEAD probe returning upstream metadata.
#[derive(Debug)]
pub struct InfoFetcher<'a, U> {
    upstream: &'a U,
}

impl<'a, U: Upstream> InfoFetcher<'a, U> {
    pub fn new(upstream: &'a U) -> Self {
        Self { upstream }
    }
}

impl<U: Upstream> Fetcher for InfoFetcher<'_, U> {
    async fn fetch(&self, params: &Params) -> Page {
        let result = self
            .upstream
            .send(UpstreamRequest {
                url: params.url.clone(),
                method: Method::HEAD,
                decompress: false,
                charset: None,
            })
            .await;

        settle(result, params.url.as_deref(), |response| {
            let content_length = response
                .header(header::CONTENT_LENGTH.as_str())
                .and_then(|v| v.trim().parse::<i64>().ok())
                // 0 is a known length; only absent or garbled headers map to -1.
                .filter(|len| *len >= 0)
                .unwrap_or(-1);

            Page::Info(InfoPage {
                url: params.url.clone().unwrap_or_default(),
                content_length,
                http_code: response.status,
            })
        })
    }
}

/// Upstream bytes without decompression.
#[derive(Debug)]
pub struct RawFetcher<'a, U> {
    upstream: &'a U,
}

impl<'a, U: Upstream> RawFetcher<'a, U> {
    pub fn new(upstream: &'a U) -> Self {
        Self { upstream }
    }
}

impl<U: Upstream> Fetcher for RawFetcher<'_, U> {
    async fn fetch(&self, params: &Params) -> Page {
        let result = self
            .upstream
            .send(UpstreamRequest {
                url: params.url.clone(),
                method: params.request_method.as_method(),
                decompress: false,
                charset: params.charset.clone(),
            })
            .await;

        settle(result, params.url.as_deref(), |response| {
            Page::Raw(RawPage::new(response.body))
        })
    }
}

/// Decoded body text with a status block.
#[derive(Debug)]
pub struct ContentsFetcher<'a, U> {
    upstream: &'a U,
}

impl<'a, U: Upstream> ContentsFetcher<'a, U> {
    pub fn new(upstream: &'a U) -> Self {
        Self { upstream }
    }
}

impl<U: Upstream> Fetcher for ContentsFetcher<'_, U> {
    async fn fetch(&self, params: &Params) -> Page {
        let result = self
            .upstream
            .send(UpstreamRequest {
                url: params.url.clone(),
                method: params.request_method.as_method(),
                decompress: true,
                charset: params.charset.clone(),
            })
            .await;

        settle(result, params.url.as_deref(), |response| {
            let contents = String::from_utf8_lossy(&response.body).into_owned();
            let content_type = response
                .header(header::CONTENT_TYPE.as_str())
                .map(str::to_string);

            Page::Contents(ContentPage {
                status: ContentStatus {
                    url: params.url.clone().unwrap_or_default(),
                    content_type,
                    content_length: contents.len(),
                    http_code: response.status,
                },
                contents,
            })
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http::request::RequestMethod;
    use crate::relay::error::{TransportError, TransportErrorKind};
    use crate::relay::page::{ErrorPage, ErrorStatus};
    use crate::relay::upstream::UpstreamResponse;
    use axum::body::Bytes;
    use axum::http::HeaderMap;
    use std::sync::Mutex;

    /// Upstream returning a canned result and recording every request.
    pub(crate) struct StubUpstream {
        result: Result<UpstreamResponse, UpstreamError>,
        pub(crate) seen: Mutex<Vec<UpstreamRequest>>,
    }

    impl StubUpstream {
        pub(crate) fn ok(status: u16, headers: &[(&'static str, &str)], body: &'static [u8]) -> Self {
            let mut map = HeaderMap::new();
            for (name, value) in headers {
                map.insert(*name, value.parse().unwrap());
            }
            Self::with(Ok(UpstreamResponse {
                url: "http://upstream.test/".into(),
                status,
                headers: map,
                body: Bytes::from_static(body),
            }))
        }

        pub(crate) fn with(result: Result<UpstreamResponse, UpstreamError>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Upstream for StubUpstream {
        async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
            self.seen.lock().unwrap().push(request);
            self.result.clone()
        }
    }

    fn params(method: RequestMethod, format: &str) -> Params {
        Params {
            request_method: method,
            format: format.into(),
            url: Some("http://upstream.test/".into()),
            charset: Some("latin1".into()),
            ..Params::default()
        }
    }

    #[tokio::test]
    async fn test_info_uses_head_and_reads_length() {
        let upstream = StubUpstream::ok(200, &[("content-length", "1234")], b"");
        let page = InfoFetcher::new(&upstream)
            .fetch(&params(RequestMethod::Post, "info"))
            .await;

        assert_eq!(
            page,
            Page::Info(InfoPage {
                url: "http://upstream.test/".into(),
                content_length: 1234,
                http_code: 200,
            })
        );
        let seen = upstream.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::HEAD);
        assert_eq!(seen[0].charset, None);
    }

    #[tokio::test]
    async fn test_info_without_length() {
        let upstream = StubUpstream::ok(204, &[], b"");
        let page = InfoFetcher::new(&upstream)
            .fetch(&params(RequestMethod::Head, "json"))
            .await;

        match page {
            Page::Info(info) => {
                assert_eq!(info.content_length, -1);
                assert_eq!(info.http_code, 204);
            }
            other => panic!("unexpected page: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_info_zero_length_is_known() {
        let upstream = StubUpstream::ok(200, &[("content-length", "0")], b"");
        let page = InfoFetcher::new(&upstream)
            .fetch(&params(RequestMethod::Get, "info"))
            .await;

        assert!(matches!(page, Page::Info(InfoPage { content_length: 0, .. })));
    }

    #[tokio::test]
    async fn test_raw_keeps_bytes_and_method() {
        let upstream = StubUpstream::ok(200, &[], &[0x89, b'P', b'N', b'G', 0x00]);
        let page = RawFetcher::new(&upstream)
            .fetch(&params(RequestMethod::Put, "raw"))
            .await;

        assert_eq!(
            page,
            Page::Raw(RawPage {
                content: Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x00]),
                content_length: 5,
            })
        );
        let seen = upstream.requests();
        assert_eq!(seen[0].method, Method::PUT);
        assert!(!seen[0].decompress);
        assert_eq!(seen[0].charset.as_deref(), Some("latin1"));
    }

    #[tokio::test]
    async fn test_contents_builds_status_block() {
        let upstream = StubUpstream::ok(
            200,
            &[("content-type", "text/html")],
            "<p>héllo</p>".as_bytes(),
        );
        let page = ContentsFetcher::new(&upstream)
            .fetch(&params(RequestMethod::Get, "json"))
            .await;

        assert_eq!(
            page,
            Page::Contents(ContentPage {
                contents: "<p>héllo</p>".into(),
                status: ContentStatus {
                    url: "http://upstream.test/".into(),
                    content_type: Some("text/html".into()),
                    content_length: 13,
                    http_code: 200,
                },
            })
        );
        assert!(upstream.requests()[0].decompress);
    }

    #[tokio::test]
    async fn test_failures_become_error_pages() {
        let upstream = StubUpstream::with(Err(UpstreamError::Transport(TransportError::new(
            TransportErrorKind::Connect,
            "refused",
        ))));

        for page in [
            InfoFetcher::new(&upstream).fetch(&params(RequestMethod::Get, "info")).await,
            RawFetcher::new(&upstream).fetch(&params(RequestMethod::Get, "raw")).await,
            ContentsFetcher::new(&upstream).fetch(&params(RequestMethod::Get, "json")).await,
        ] {
            assert!(matches!(
                page,
                Page::Error(ErrorPage {
                    contents: None,
                    status: ErrorStatus::Transport { .. },
                })
            ));
        }
        assert_eq!(upstream.requests().len(), 3);
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (tracing, timeout, request ID, CORS)
//! - Bind server to listener
//! - Run one relay cycle per inbound request

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CacheConfig, RelayConfig};
use crate::http::request::{MakeRequestUuid, Params, RequestMethod, X_REQUEST_ID};
use crate::http::response::ResponseBuilder;
use crate::lifecycle::signals::shutdown_signal;
use crate::relay::{select_mode, HttpUpstream, Relay, Upstream};

/// Application state injected into handlers.
#[derive(Debug)]
pub struct AppState<U> {
    pub relay: Relay<U>,
    pub cache: CacheConfig,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server backed by the reqwest upstream client.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let upstream = HttpUpstream::new(&config.upstream)?;
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create a server over any upstream implementation.
    pub fn with_upstream<U>(config: RelayConfig, upstream: U) -> Self
    where
        U: Upstream + 'static,
    {
        let state = Arc::new(AppState {
            relay: Relay::new(upstream),
            cache: config.cache.clone(),
        });

        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<U>(config: &RelayConfig, state: Arc<AppState<U>>) -> Router
    where
        U: Upstream + 'static,
    {
        let router = Router::new()
            .route("/", any(relay_handler::<U>))
            .route("/{*path}", any(relay_handler::<U>))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid));

        if config.cors.enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The assembled router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or an OS signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Relay handler: parse, dispatch, fetch, respond.
async fn relay_handler<U: Upstream>(
    State(state): State<Arc<AppState<U>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let params = Params::from_parts(&method, &uri);
    if params.request_method == RequestMethod::Options {
        return ResponseBuilder::empty();
    }

    let mode = select_mode(&params.format, params.request_method);
    tracing::debug!(
        request_id = %request_id,
        method = %params.request_method,
        format = %params.format,
        mode = %mode,
        url = params.url.as_deref().unwrap_or_default(),
        "Relaying request"
    );

    let page = state.relay.fetch(mode, &params).await;
    let elapsed = started.elapsed();

    tracing::debug!(
        request_id = %request_id,
        page = page.kind(),
        http_code = page.http_code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Relay complete"
    );

    ResponseBuilder::new(&state.cache).build(page, &params, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::fetch::tests::StubUpstream;
    use crate::relay::{TransportError, TransportErrorKind, UpstreamError};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(server: &HttpServer, method: &str, uri: &str) -> Response {
        server
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let server = HttpServer::with_upstream(
            RelayConfig::default(),
            StubUpstream::ok(200, &[], b"never"),
        );
        let response = call(&server, "OPTIONS", "/raw?url=http://upstream.test/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_format_behaves_like_json() {
        let server = HttpServer::with_upstream(
            RelayConfig::default(),
            StubUpstream::ok(200, &[("content-type", "text/plain")], b"hello"),
        );

        let default = json(call(&server, "GET", "/?url=http://upstream.test/").await).await;
        let unknown = json(call(&server, "GET", "/xyz?url=http://upstream.test/").await).await;

        assert_eq!(default["contents"], "hello");
        assert_eq!(unknown["contents"], default["contents"]);
        assert_eq!(unknown["status"]["content_type"], "text/plain");
        assert_eq!(unknown["status"]["http_code"], 200);
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_200() {
        let server = HttpServer::with_upstream(
            RelayConfig::default(),
            StubUpstream::with(Err(UpstreamError::Transport(TransportError::new(
                TransportErrorKind::Connect,
                "dns error",
            )))),
        );
        let response = call(&server, "GET", "/get?url=http://nowhere.invalid/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        let value = json(response).await;
        assert_eq!(value["contents"], Value::Null);
        assert_eq!(value["status"]["error"]["message"], "dns error");
    }

    #[tokio::test]
    async fn test_request_id_is_attached() {
        let server = HttpServer::with_upstream(
            RelayConfig::default(),
            StubUpstream::ok(200, &[], b"ok"),
        );
        let response = call(&server, "GET", "/?url=http://upstream.test/").await;
        assert!(response.headers().get(X_REQUEST_ID).is_some());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let server = HttpServer::with_upstream(
            RelayConfig::default(),
            StubUpstream::ok(200, &[], b"ok"),
        );
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/?url=http://upstream.test/")
                    .header(header::ORIGIN, "http://browser.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }
}

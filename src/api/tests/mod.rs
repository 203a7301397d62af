use super::*;
use crate::Config;
use crate::provider::PictureProvider;
use crate::types::DateRange;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

mod config;
mod system;

type Reply = Box<dyn Fn(DateRange) -> crate::Result<Vec<String>> + Send + Sync>;

/// Provider double that records the ranges it was asked for
struct MockProvider {
    reply: Reply,
    calls: Mutex<Vec<DateRange>>,
}

impl MockProvider {
    fn new(
        reply: impl Fn(DateRange) -> crate::Result<Vec<String>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<DateRange> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PictureProvider for MockProvider {
    async fn get_pictures(
        &self,
        range: DateRange,
        _cancel: &CancellationToken,
    ) -> crate::Result<Vec<String>> {
        self.calls.lock().unwrap().push(range);
        (self.reply)(range)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Provider that never finishes on its own, only when cancelled
///
/// `entered` is notified once a request has reached the provider.
#[derive(Default)]
struct PendingProvider {
    entered: Arc<Notify>,
}

#[async_trait]
impl PictureProvider for PendingProvider {
    async fn get_pictures(
        &self,
        _range: DateRange,
        cancel: &CancellationToken,
    ) -> crate::Result<Vec<String>> {
        self.entered.notify_one();
        cancel.cancelled().await;
        Err(crate::Error::Resolve(crate::error::ResolveError::Cancelled))
    }

    fn name(&self) -> &'static str {
        "pending"
    }
}

fn router_with(provider: Arc<dyn PictureProvider>, config: Config) -> Router {
    create_router(AppState::new(provider, Arc::new(config)))
}

fn default_router() -> Router {
    router_with(MockProvider::new(|_| Ok(vec![])), Config::default())
}

/// Send one request and decode the JSON body
async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("response to {method} {uri} is not JSON ({e})"));
    (status, json)
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let app = router_with(MockProvider::new(|_| Ok(vec![])), config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.server.cors_enabled = false;
    let app = router_with(MockProvider::new(|_| Ok(vec![])), config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let (status, body) = send(default_router(), "GET", "/testinvalidpath").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_wrong_method_is_404() {
    for method in ["POST", "PUT", "DELETE"] {
        let (status, body) = send(default_router(), method, "/pictures").await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} /pictures");
        assert_eq!(body["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn test_serve_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState::new(
        MockProvider::new(|_| Ok(vec![])),
        Arc::new(Config::default()),
    );
    let shutdown = state.shutdown.clone();
    let server = tokio::spawn(serve(listener, state));

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_requests() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let provider = Arc::new(PendingProvider::default());
    let entered = Arc::clone(&provider.entered);
    let state = AppState::new(provider, Arc::new(Config::default()));
    let shutdown = state.shutdown.clone();
    let server = tokio::spawn(serve(listener, state));

    let request = tokio::spawn(async move {
        reqwest::get(format!("http://{addr}/pictures?from=2022-01-01&to=2022-01-02"))
            .await
            .unwrap()
    });

    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .expect("request should reach the provider");
    shutdown.cancel();

    let response = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .expect("in-flight request should be answered")
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown")
        .unwrap()
        .unwrap();
}

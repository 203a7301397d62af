use super::*;

#[tokio::test]
async fn test_health_check_returns_status_ok_and_version() {
    let (status, body) = send(default_router(), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint_serves_document() {
    let (status, body) = send(default_router(), "GET", "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "url-collector REST API");
    assert!(body["paths"]["/pictures"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let request = || {
        Request::builder()
            .uri("/swagger-ui/")
            .body(Body::empty())
            .unwrap()
    };

    let response = default_router().oneshot(request()).await.unwrap();
    assert_ne!(response.status(), StatusCode::NOT_FOUND);

    let mut config = Config::default();
    config.server.swagger_ui = false;
    let app = router_with(MockProvider::new(|_| Ok(vec![])), config);
    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_with_wrong_method_returns_404() {
    let (status, _) = send(default_router(), "POST", "/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

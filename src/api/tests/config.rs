use super::*;

#[tokio::test]
async fn test_get_config_endpoint() {
    let mut config = Config::default();
    config.provider.api_key = "super_secret_key".to_string();
    config.provider.concurrent_requests = 7;
    let app = router_with(MockProvider::new(|_| Ok(vec![])), config);

    let (status, body) = send(app, "GET", "/config").await;
    assert_eq!(status, StatusCode::OK, "get_config should return 200 OK");

    let returned: Config = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(returned.provider.concurrent_requests, 7);
    assert_eq!(returned.server.bind_address.port(), 8080);

    assert!(
        !body.to_string().contains("super_secret_key"),
        "API key must be redacted"
    );
    assert_eq!(body["provider"]["api_key"], "***REDACTED***");
}

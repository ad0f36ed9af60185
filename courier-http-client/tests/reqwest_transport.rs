//! Real HTTP transport against a wiremock server

use courier_core::{ErrorKind, ServiceName};
use courier_http_client::{
    AuthTokens, HttpClient, HttpClientConfig, InMemoryTokenStore, ReqwestTransport, RetryConfig,
    TokenStore, Transport, TransportError, TransportRequest,
};
use http::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, retries: u32) -> (HttpClient, Arc<InMemoryTokenStore>) {
    let config = HttpClientConfig::builder()
        .enable_mock(false)
        .base_url(ServiceName::User, format!("{}/api/user", server.uri()))
        .base_url(ServiceName::Auth, format!("{}/api/auth", server.uri()))
        .retry(RetryConfig::constant(retries, Duration::from_millis(10)))
        .build();
    let tokens = Arc::new(InMemoryTokenStore::new());
    let client = HttpClient::builder(config).token_store(tokens.clone()).build();
    (client, tokens)
}

#[tokio::test]
async fn test_get_with_headers_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(query_param("fields", "name"))
        .and(header("authorization", "Bearer tok"))
        .and(header("x-platform", "mobile"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server, 0);
    tokens.store_tokens(&AuthTokens::new("tok", "ref")).await.unwrap();

    let profile: Value = client
        .get(ServiceName::User, "profile")
        .query("fields", "name")
        .send()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Ada");
}

#[tokio::test]
async fn test_post_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "a@b.co", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let body: Value = client
        .post(ServiceName::Auth, "/login")
        .json(&json!({"email": "a@b.co", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 2);
    let err = client
        .get(ServiceName::User, "profile")
        .send::<Value>()
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorKind::ServerError);
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn test_server_code_wins_over_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": {"code": "USERNAME_TAKEN", "message": "taken"}})),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let err = client
        .post(ServiceName::Auth, "register")
        .json(&json!({}))
        .send::<Value>()
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorKind::UsernameTaken);
    assert_eq!(err.status_code(), Some(409));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let err = client
        .get(ServiceName::User, "profile")
        .timeout(Duration::from_millis(50))
        .send::<Value>()
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorKind::TimeoutError);
}

#[tokio::test]
async fn test_stalled_body_reports_request_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let config = HttpClientConfig::builder()
        .base_url(ServiceName::Feed, format!("http://{addr}"))
        .build();
    let transport = ReqwestTransport::new(&config.service_settings(ServiceName::Feed).unwrap()).unwrap();

    let mut request = TransportRequest::new(Method::GET, "posts");
    request.timeout = Duration::from_millis(200);
    let err = transport.send(request).await.unwrap_err();

    match err {
        TransportError::Timeout(after) => assert_eq!(after, Duration::from_millis(200)),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let config = HttpClientConfig::builder()
        .enable_mock(false)
        .base_url(ServiceName::Feed, "http://127.0.0.1:9")
        .retry(RetryConfig::disabled())
        .build();
    let client = HttpClient::new(config);

    let err = client.get(ServiceName::Feed, "posts").send::<Value>().await.unwrap_err();
    assert!(err.is_retryable());
}

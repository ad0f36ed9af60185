//! End-to-end scenarios across the whole request layer.
//!
//! The domain services run against the in-process mock backend and against
//! a wiremock server through the real HTTP transport.

use courier::prelude::*;
use courier::MockTransport;
use courier_services::models::LoginRequest;
use courier_services::{Services, build_client, mock_backend};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_services() -> (Services, MockTransport) {
    let mock = mock_backend();
    let client = HttpClient::builder(HttpClientConfig::from(&ApiConfig::default()))
        .transport_factory(mock.clone())
        .build();
    (Services::new(client), mock)
}

// =============================================================================
// Mock backend
// =============================================================================

#[tokio::test]
async fn test_login_with_mock_credentials() {
    let services = Services::new(build_client(&ApiConfig::default()));

    let response = services
        .auth
        .login(&LoginRequest::new("test@example.com", "password"))
        .await
        .unwrap();

    assert!(response.is_success());
    let tokens = response.data.unwrap().tokens;
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
}

#[tokio::test]
async fn test_login_with_wrong_credentials() {
    let services = Services::new(build_client(&ApiConfig::default()));

    let err = services
        .auth
        .login(&LoginRequest::new("test@example.com", "not-the-password"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorKind::InvalidCredentials);
    assert!(err.is_auth_error());
    assert!(!err.is_retryable());
    assert!(err.request_id().is_some());
}

#[tokio::test]
async fn test_protected_endpoint_without_token() {
    let (services, mock) = mock_services();

    let err = services.user.profile().await.unwrap_err();

    // The server answered; nothing short-circuited locally.
    assert_eq!(err.code(), ErrorKind::Unauthorized);
    assert_eq!(err.status_code(), Some(401));
    let recorded = mock.requests_to(ServiceName::User, "profile");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].request.header("Authorization"), None);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (services, mock) = mock_services();

    services
        .auth
        .login(&LoginRequest::new("test@example.com", "password"))
        .await
        .unwrap();
    let profile = services.user.profile().await.unwrap();
    assert_eq!(profile.username, "testuser");

    services.auth.logout().await.unwrap();
    let err = services.user.profile().await.unwrap_err();
    assert_eq!(err.code(), ErrorKind::Unauthorized);

    let profiles = mock.requests_to(ServiceName::User, "profile");
    assert_eq!(profiles.len(), 2);
    assert_eq!(
        profiles[0].request.header("Authorization"),
        Some("Bearer mock-access-token")
    );
    assert_eq!(profiles[1].request.header("Authorization"), None);
}

#[tokio::test]
async fn test_analytics_follow_outcomes() {
    let (services, _) = mock_services();
    let analytics = services.client.analytics().clone();

    for password in ["password", "wrong", "wrong", "password"] {
        let _ = services
            .auth
            .login(&LoginRequest::new("test@example.com", password))
            .await;
    }

    let health = analytics.service_health(ServiceName::Auth).unwrap();
    assert_eq!(health.total_requests, 4);
    assert_eq!(health.failed_requests, 2);
    assert!((health.error_rate - 50.0).abs() < f64::EPSILON);
    assert!(!health.is_healthy);

    let snapshot = analytics.snapshot();
    assert_eq!(snapshot.metrics.len(), 4);
    assert!(snapshot.to_json().is_ok());
}

#[tokio::test]
async fn test_error_record_round_trips() {
    let (services, _) = mock_services();

    let err = services.user.profile().await.unwrap_err();
    let restored = ApiError::from_json(err.to_json()).unwrap();

    assert_eq!(restored.code(), err.code());
    assert_eq!(restored.status_code(), err.status_code());
    assert_eq!(restored.request_id(), err.request_id());
    assert_eq!(restored.timestamp(), err.timestamp());
}

// =============================================================================
// Real transport
// =============================================================================

#[tokio::test]
async fn test_services_over_http() {
    courier_log::init();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("x-environment", "staging"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Login successful",
            "data": {
                "user": {
                    "id": "42",
                    "email": "test@example.com",
                    "username": "tester",
                    "firstName": "Test",
                    "lastName": "Er"
                },
                "accessToken": "live-token",
                "refreshToken": "live-refresh"
            },
            "statusCode": 200
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("authorization", "Bearer live-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "id": "42",
                "email": "test@example.com",
                "username": "tester",
                "firstName": "Test",
                "lastName": "Er"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vars = HashMap::from([
        ("environment".to_string(), "staging".to_string()),
        ("enable_mock".to_string(), "false".to_string()),
        ("auth_url".to_string(), format!("{}/auth", server.uri())),
        ("user_url".to_string(), format!("{}/user", server.uri())),
    ]);
    let config = ApiConfig::from_vars(&vars).unwrap();
    let services = Services::new(build_client(&config));

    services
        .auth
        .login(&LoginRequest::new("test@example.com", "password"))
        .await
        .unwrap();
    let profile = services.user.profile().await.unwrap();

    assert_eq!(profile.id, "42");
    assert!(services.client.analytics().is_service_healthy(ServiceName::User));
}

//! In-process simulation of the auth and user backends.

use courier_core::ServiceName;
use courier_http_client::{MockTransport, TransportRequest, TransportResponse};
use http::Method;
use serde_json::{Value, json};

pub const MOCK_EMAIL: &str = "test@example.com";
pub const MOCK_PASSWORD: &str = "password";
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";
pub const MOCK_REFRESH_TOKEN: &str = "mock-refresh-token";
/// Access token the user backend treats as expired.
pub const EXPIRED_ACCESS_TOKEN: &str = "expired-token";
pub const MOCK_OTP: &str = "123456";

const TAKEN_USERNAMES: &[&str] = &["admin", "testuser", "taken"];

fn success(status: u16, message: &str, data: Value) -> TransportResponse {
    TransportResponse::json(
        status,
        &json!({
            "status": "success",
            "message": message,
            "data": data,
            "timestamp": chrono::Utc::now(),
            "statusCode": status,
        }),
    )
}

fn failure(status: u16, code: &str, message: &str) -> TransportResponse {
    TransportResponse::json(
        status,
        &json!({
            "status": "error",
            "code": code,
            "message": message,
            "statusCode": status,
        }),
    )
}

fn body_str<'a>(request: &'a TransportRequest, key: &str) -> &'a str {
    request
        .body
        .as_ref()
        .and_then(|b| b.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn mock_user() -> Value {
    json!({
        "id": "user-1",
        "email": MOCK_EMAIL,
        "username": "testuser",
        "firstName": "Test",
        "lastName": "User",
        "createdAt": "2024-01-01T00:00:00Z",
    })
}

fn session(user: Value) -> Value {
    json!({
        "user": user,
        "accessToken": MOCK_ACCESS_TOKEN,
        "refreshToken": MOCK_REFRESH_TOKEN,
        "expiresIn": 3600,
    })
}

/// Check the bearer token the way the user backend does.
fn authorize(request: &TransportRequest) -> Result<(), TransportResponse> {
    let token = request
        .header("Authorization")
        .and_then(|h| h.strip_prefix("Bearer "));
    match token {
        Some(MOCK_ACCESS_TOKEN) => Ok(()),
        Some(EXPIRED_ACCESS_TOKEN) => Err(failure(401, "TOKEN_EXPIRED", "Access token has expired")),
        _ => Err(failure(401, "UNAUTHORIZED", "Authentication required")),
    }
}

/// Mock transport answering the auth and user endpoints.
///
/// `test@example.com` / `password` logs in with [`MOCK_ACCESS_TOKEN`];
/// `user/profile` requires that token. OTP [`MOCK_OTP`] is always valid.
pub fn mock_backend() -> MockTransport {
    let mock = MockTransport::new();
    let auth = ServiceName::Auth;

    mock.route(auth, Method::POST, "login", |request| {
        if body_str(request, "email") == MOCK_EMAIL && body_str(request, "password") == MOCK_PASSWORD {
            Ok(success(200, "Login successful", session(mock_user())))
        } else {
            Ok(failure(401, "INVALID_CREDENTIALS", "Invalid email or password"))
        }
    });

    mock.route(auth, Method::POST, "register", |request| {
        let username = body_str(request, "username");
        if body_str(request, "email") == MOCK_EMAIL {
            return Ok(failure(409, "EMAIL_ALREADY_EXISTS", "Email is already registered"));
        }
        if TAKEN_USERNAMES.contains(&username) {
            return Ok(failure(409, "USERNAME_TAKEN", "Username is already taken"));
        }
        let user = json!({
            "id": "user-2",
            "email": body_str(request, "email"),
            "username": username,
            "firstName": body_str(request, "firstName"),
            "lastName": body_str(request, "lastName"),
        });
        Ok(success(201, "Registration successful", session(user)))
    });

    mock.route(auth, Method::GET, "validate-username", |request| {
        let username = request
            .query
            .iter()
            .find(|(k, _)| k == "username")
            .map(|(_, v)| v.as_str())
            .unwrap_or_default();
        Ok(success(
            200,
            "Username checked",
            json!({ "username": username, "available": !TAKEN_USERNAMES.contains(&username) }),
        ))
    });

    mock.route(auth, Method::POST, "generate-otp", |_| {
        Ok(success(200, "OTP sent", json!({ "expiresIn": 300 })))
    });

    mock.route(auth, Method::POST, "verify-otp", |request| {
        if body_str(request, "otp") == MOCK_OTP {
            Ok(success(200, "OTP verified", json!({ "verified": true })))
        } else {
            Ok(failure(400, "INVALID_OTP", "Invalid verification code"))
        }
    });

    mock.route(auth, Method::POST, "forgot-password", |_| {
        Ok(success(200, "Reset code sent", Value::Null))
    });

    mock.route(auth, Method::POST, "reset-password", |request| {
        if body_str(request, "otp") == MOCK_OTP {
            Ok(success(200, "Password reset", Value::Null))
        } else {
            Ok(failure(400, "INVALID_OTP", "Invalid verification code"))
        }
    });

    mock.route(auth, Method::POST, "refresh-token", |request| {
        if body_str(request, "refreshToken") == MOCK_REFRESH_TOKEN {
            Ok(success(
                200,
                "Token refreshed",
                json!({
                    "accessToken": MOCK_ACCESS_TOKEN,
                    "refreshToken": MOCK_REFRESH_TOKEN,
                    "expiresIn": 3600,
                }),
            ))
        } else {
            Ok(failure(401, "TOKEN_INVALID", "Refresh token is invalid"))
        }
    });

    mock.route(auth, Method::POST, "logout", |_| {
        Ok(success(200, "Logged out", Value::Null))
    });

    mock.route(ServiceName::User, Method::GET, "profile", |request| {
        Ok(match authorize(request) {
            Ok(()) => success(200, "Profile loaded", mock_user()),
            Err(denied) => denied,
        })
    });

    mock.route(ServiceName::User, Method::PUT, "profile", |request| {
        if let Err(denied) = authorize(request) {
            return Ok(denied);
        }
        let mut user = mock_user();
        if let (Some(target), Some(Value::Object(update))) = (user.as_object_mut(), &request.body) {
            for (key, value) in update {
                if !value.is_null() {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(success(200, "Profile updated", user))
    });

    mock
}

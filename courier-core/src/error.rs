//! API error taxonomy.
//!
//! Every failure that leaves the request layer (transport, HTTP status, or
//! input validation) is normalized into a single [`ApiError`] whose
//! [`ErrorKind`] is drawn from a closed set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Closed set of classified failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Transport
    NetworkError,
    TimeoutError,
    ConnectionError,

    // HTTP status
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ValidationError,
    RateLimited,
    ServerError,

    // Authentication
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    AccountLocked,

    // Business rules
    UserNotFound,
    EmailAlreadyExists,
    UsernameTaken,
    InvalidOtp,
    OtpExpired,

    // Input
    InvalidInput,
    MissingRequiredField,
    InvalidFormat,

    UnknownError,
}

impl ErrorKind {
    /// Every member of the taxonomy, in declaration order.
    pub const ALL: [ErrorKind; 24] = [
        ErrorKind::NetworkError,
        ErrorKind::TimeoutError,
        ErrorKind::ConnectionError,
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::ValidationError,
        ErrorKind::RateLimited,
        ErrorKind::ServerError,
        ErrorKind::InvalidCredentials,
        ErrorKind::TokenExpired,
        ErrorKind::TokenInvalid,
        ErrorKind::AccountLocked,
        ErrorKind::UserNotFound,
        ErrorKind::EmailAlreadyExists,
        ErrorKind::UsernameTaken,
        ErrorKind::InvalidOtp,
        ErrorKind::OtpExpired,
        ErrorKind::InvalidInput,
        ErrorKind::MissingRequiredField,
        ErrorKind::InvalidFormat,
        ErrorKind::UnknownError,
    ];

    /// Wire code, e.g. `"TOKEN_EXPIRED"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Look up a kind by its wire code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == code)
    }

    /// Map a non-success HTTP status to a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            422 => Self::ValidationError,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::UnknownError,
        }
    }

    /// Display-safe message template for this kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NetworkError => {
                "Unable to reach the server. Please check your internet connection."
            }
            Self::TimeoutError => "The request took too long. Please try again.",
            Self::ConnectionError => "Could not connect to the server. Please try again later.",
            Self::BadRequest => "The request could not be processed. Please check your input.",
            Self::Unauthorized => "Your session has ended. Please sign in again.",
            Self::Forbidden => "You don't have permission to do that.",
            Self::NotFound => "The requested item could not be found.",
            Self::Conflict => "This action conflicts with existing data.",
            Self::ValidationError => "Please check your input and try again.",
            Self::RateLimited => "Too many requests. Please wait a moment and try again.",
            Self::ServerError => "Something went wrong on our end. Please try again later.",
            Self::InvalidCredentials => "Incorrect email or password.",
            Self::TokenExpired => "Your session has expired. Please sign in again.",
            Self::TokenInvalid => "Your session is invalid. Please sign in again.",
            Self::AccountLocked => "Your account has been locked. Please contact support.",
            Self::UserNotFound => "No account was found with those details.",
            Self::EmailAlreadyExists => "An account with this email already exists.",
            Self::UsernameTaken => "This username is already taken.",
            Self::InvalidOtp => "The verification code is incorrect.",
            Self::OtpExpired => "The verification code has expired. Please request a new one.",
            Self::InvalidInput => "Some of the information entered is invalid.",
            Self::MissingRequiredField => "Please fill in all required fields.",
            Self::InvalidFormat => "Some information is in the wrong format.",
            Self::UnknownError => "An unexpected error occurred. Please try again.",
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::TimeoutError | Self::ConnectionError | Self::ServerError
        )
    }

    /// Failures that mean the caller's identity was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::InvalidCredentials
                | Self::TokenExpired
                | Self::TokenInvalid
                | Self::AccountLocked
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a transport observed when no response came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSignal {
    /// The call exceeded its deadline.
    Timeout,
    /// The host could not be resolved or refused the connection.
    Connection,
    /// Any other failure before a response arrived.
    Other,
}

impl NetworkSignal {
    /// Best-effort classification of a free-text transport error.
    pub fn classify(detail: &str) -> Self {
        let detail = detail.to_ascii_lowercase();
        if ["timeout", "timed out", "etimedout", "econnaborted"]
            .iter()
            .any(|needle| detail.contains(needle))
        {
            Self::Timeout
        } else if [
            "econnrefused",
            "connection refused",
            "enotfound",
            "dns error",
            "failed to lookup",
            "host unreachable",
            "no route to host",
        ]
        .iter()
        .any(|needle| detail.contains(needle))
        {
            Self::Connection
        } else {
            Self::Other
        }
    }

    fn kind(self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::TimeoutError,
            Self::Connection => ErrorKind::ConnectionError,
            Self::Other => ErrorKind::NetworkError,
        }
    }
}

/// The only error type surfaced by the request layer.
///
/// `message` is meant for logs and may carry server-internal detail;
/// `user_message` is always safe to show directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct ApiError {
    code: ErrorKind,
    message: String,
    user_message: String,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    field: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    request_id: Option<String>,
}

impl ApiError {
    /// Create an error of the given kind with the kind's default user message.
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            user_message: code.user_message().to_string(),
            status_code: None,
            field: None,
            timestamp: Utc::now(),
            request_id: None,
        }
    }

    /// Classify a failure where no response was received.
    pub fn from_network(signal: NetworkSignal, detail: impl Into<String>) -> Self {
        Self::new(signal.kind(), detail)
    }

    /// Classify an HTTP error response.
    ///
    /// A machine-readable code in the body (`code`, `errorCode` or
    /// `error.code`) wins over the status mapping when it names a known kind.
    pub fn from_http_response(status: u16, body: Option<&Value>) -> Self {
        let server_code = body
            .and_then(|b| body_str(b, "code").or_else(|| body_str(b, "errorCode")))
            .and_then(ErrorKind::from_code);
        let server_message = body.and_then(|b| body_str(b, "message")).map(str::to_string);
        let field = body.and_then(|b| body_str(b, "field")).map(str::to_string);

        let code = server_code.unwrap_or_else(|| ErrorKind::from_status(status));
        let message = server_message
            .clone()
            .unwrap_or_else(|| format!("Request failed with status code {}", status));

        let user_message = match (code, server_message) {
            (ErrorKind::ValidationError, Some(server)) => server,
            _ => code.user_message().to_string(),
        };

        Self {
            code,
            message,
            user_message,
            status_code: Some(status),
            field,
            timestamp: Utc::now(),
            request_id: None,
        }
    }

    /// A field-level validation failure raised before any network call.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            user_message: message.clone(),
            field: Some(field.into()),
            ..Self::new(ErrorKind::ValidationError, message)
        }
    }

    /// Pending work dropped by a bulk cancellation.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::UnknownError, "Request cancelled")
    }

    /// Attach the id of the request this error belongs to.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the offending field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach an HTTP status code.
    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Replace the display message.
    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = user_message.into();
        self
    }

    pub fn code(&self) -> ErrorKind {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn is_auth_error(&self) -> bool {
        self.code.is_auth_error()
    }

    /// Serialize to a JSON object with camelCase keys.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "code": self.code,
                "message": self.message,
                "userMessage": self.user_message,
            })
        })
    }

    /// Rebuild an error from the output of [`ApiError::to_json`].
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Look up a string in the body root, falling back to a nested `error` object.
fn body_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(|e| e.get(key)).and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Conflict),
            (422, ErrorKind::ValidationError),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::ServerError),
            (502, ErrorKind::ServerError),
            (503, ErrorKind::ServerError),
            (504, ErrorKind::ServerError),
        ];

        for (status, expected) in cases {
            let error = ApiError::from_http_response(status, None);
            assert_eq!(error.code(), expected, "status {}", status);
            assert_eq!(error.status_code(), Some(status));
        }

        for status in [301, 402, 405, 418, 451] {
            assert_eq!(
                ApiError::from_http_response(status, None).code(),
                ErrorKind::UnknownError
            );
        }
    }

    #[test]
    fn test_server_code_wins_over_status() {
        let body = json!({"code": "INVALID_CREDENTIALS", "message": "bad password"});
        let error = ApiError::from_http_response(401, Some(&body));

        assert_eq!(error.code(), ErrorKind::InvalidCredentials);
        assert_eq!(error.message(), "bad password");
        assert_eq!(error.user_message(), "Incorrect email or password.");
    }

    #[test]
    fn test_nested_error_code() {
        let body = json!({"error": {"code": "TOKEN_EXPIRED", "message": "jwt expired"}});
        let error = ApiError::from_http_response(401, Some(&body));

        assert_eq!(error.code(), ErrorKind::TokenExpired);
        assert_eq!(error.message(), "jwt expired");
    }

    #[test]
    fn test_unknown_server_code_falls_back_to_status() {
        let body = json!({"code": "SOMETHING_NEW"});
        let error = ApiError::from_http_response(404, Some(&body));
        assert_eq!(error.code(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validation_prefers_server_message() {
        let body = json!({"message": "Email is malformed", "field": "email"});
        let error = ApiError::from_http_response(422, Some(&body));

        assert_eq!(error.code(), ErrorKind::ValidationError);
        assert_eq!(error.user_message(), "Email is malformed");
        assert_eq!(error.field(), Some("email"));

        let error = ApiError::from_http_response(422, None);
        assert_eq!(error.user_message(), ErrorKind::ValidationError.user_message());
    }

    #[test]
    fn test_network_classification() {
        assert_eq!(
            ApiError::from_network(NetworkSignal::classify("operation timed out"), "x").code(),
            ErrorKind::TimeoutError
        );
        assert_eq!(
            ApiError::from_network(NetworkSignal::classify("ECONNREFUSED 127.0.0.1"), "x").code(),
            ErrorKind::ConnectionError
        );
        assert_eq!(
            ApiError::from_network(NetworkSignal::classify("socket hang up"), "x").code(),
            ErrorKind::NetworkError
        );
    }

    #[test]
    fn test_connection_needles_stay_narrow() {
        for detail in [
            "connection reset by peer",
            "disconnected",
            "error sending request for url (http://localhost:3000/api/user/profile)",
        ] {
            assert_eq!(NetworkSignal::classify(detail), NetworkSignal::Other, "{detail}");
        }
        for detail in [
            "tcp connect error: Connection refused (os error 111)",
            "dns error: failed to lookup address information",
            "No route to host",
            "getaddrinfo ENOTFOUND api.example.com",
        ] {
            assert_eq!(NetworkSignal::classify(detail), NetworkSignal::Connection, "{detail}");
        }
    }

    #[test]
    fn test_retryable_set() {
        for kind in ErrorKind::ALL {
            let expected = matches!(
                kind,
                ErrorKind::NetworkError
                    | ErrorKind::TimeoutError
                    | ErrorKind::ConnectionError
                    | ErrorKind::ServerError
            );
            assert_eq!(kind.is_retryable(), expected, "{}", kind);
        }
    }

    #[test]
    fn test_auth_error_set() {
        let auth: Vec<_> = ErrorKind::ALL
            .iter()
            .filter(|k| k.is_auth_error())
            .copied()
            .collect();
        assert_eq!(
            auth,
            vec![
                ErrorKind::Unauthorized,
                ErrorKind::InvalidCredentials,
                ErrorKind::TokenExpired,
                ErrorKind::TokenInvalid,
                ErrorKind::AccountLocked,
            ]
        );
    }

    #[test]
    fn test_code_lookup() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.as_str()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("nope"), None);
    }

    #[test]
    fn test_json_round_trip() {
        let error = ApiError::from_http_response(503, None).with_request_id("req-42");
        let json = error.to_json();

        assert_eq!(json["code"], "SERVER_ERROR");
        assert_eq!(json["statusCode"], 503);
        assert_eq!(json["requestId"], "req-42");

        let back = ApiError::from_json(json).unwrap();
        assert_eq!(back.code(), error.code());
        assert_eq!(back.status_code(), error.status_code());
        assert_eq!(back.request_id(), error.request_id());
        assert_eq!(back.timestamp(), error.timestamp());
    }

    #[test]
    fn test_display() {
        let error = ApiError::new(ErrorKind::NotFound, "no such user");
        assert_eq!(error.to_string(), "NOT_FOUND: no such user");
    }
}

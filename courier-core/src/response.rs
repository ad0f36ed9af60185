//! Server response envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome flag carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Standard `{status, message, data, timestamp, statusCode}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status_code: u16,
}

impl<T> ApiResponse<T> {
    /// A successful envelope around `data`.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
            status_code: 200,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_envelope() {
        let body = json!({
            "status": "success",
            "message": "ok",
            "data": {"id": 7},
            "statusCode": 200
        });

        let response: ApiResponse<serde_json::Value> = serde_json::from_value(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.into_data().unwrap()["id"], 7);
    }

    #[test]
    fn test_missing_data() {
        let body = json!({"status": "error", "message": "nope"});
        let response: ApiResponse<u32> = serde_json::from_value(body).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.data, None);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Profile {
        id: String,
    }

    #[test]
    fn test_payload_without_default() {
        let body = json!({"status": "success", "data": {"id": "u1"}});
        let response: ApiResponse<Profile> = serde_json::from_value(body).unwrap();
        assert_eq!(response.into_data(), Some(Profile { id: "u1".into() }));

        let body = json!({"status": "error"});
        let response: ApiResponse<Profile> = serde_json::from_value(body).unwrap();
        assert_eq!(response.data, None);
    }
}

//! Token storage and refresh collaborators.

use async_trait::async_trait;
use courier_core::ApiError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access and refresh token pair issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in: None,
        }
    }
}

/// Token store failure.
#[derive(Debug, Clone, Error)]
pub enum TokenStoreError {
    #[error("Token store unavailable: {0}")]
    Unavailable(String),

    #[error("Token store error: {0}")]
    Other(String),
}

/// Persistent storage for the current session's tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_access_token(&self) -> Result<Option<String>, TokenStoreError>;

    async fn get_refresh_token(&self) -> Result<Option<String>, TokenStoreError>;

    async fn store_tokens(&self, tokens: &AuthTokens) -> Result<(), TokenStoreError>;

    async fn clear_tokens(&self) -> Result<(), TokenStoreError>;
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Option<AuthTokens>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `tokens`.
    pub fn with_tokens(tokens: AuthTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }

    pub fn tokens(&self) -> Option<AuthTokens> {
        self.tokens.read().clone()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_access_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.tokens.read().as_ref().map(|t| t.access_token.clone()))
    }

    async fn get_refresh_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.tokens.read().as_ref().map(|t| t.refresh_token.clone()))
    }

    async fn store_tokens(&self, tokens: &AuthTokens) -> Result<(), TokenStoreError> {
        *self.tokens.write() = Some(tokens.clone());
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), TokenStoreError> {
        *self.tokens.write() = None;
        Ok(())
    }
}

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.get_access_token().await.unwrap(), None);

        store
            .store_tokens(&AuthTokens::new("access", "refresh"))
            .await
            .unwrap();
        assert_eq!(store.get_access_token().await.unwrap().as_deref(), Some("access"));
        assert_eq!(store.get_refresh_token().await.unwrap().as_deref(), Some("refresh"));

        store.clear_tokens().await.unwrap();
        assert!(store.tokens().is_none());
    }

    #[test]
    fn test_tokens_serialize_camel_case() {
        let json = serde_json::to_value(AuthTokens::new("a", "r")).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert!(json.get("expiresIn").is_none());
    }
}

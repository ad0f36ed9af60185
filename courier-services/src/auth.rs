//! Auth service caller.

use crate::models::{
    AuthPayload, LoginRequest, RegisterRequest, ResetPasswordRequest, UsernameAvailability,
};
use crate::validated;
use async_trait::async_trait;
use courier_core::{ApiError, ApiResponse, ErrorKind, ServiceName};
use courier_http_client::{AuthTokens, HttpClient, TokenRefresher};
use courier_validation::{CommonSchemas, ValidationSchema};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Login, registration, OTP and session management.
#[derive(Debug)]
pub struct AuthService {
    client: HttpClient,
}

impl AuthService {
    /// Create the service and register it as the client's token refresher.
    pub fn new(client: HttpClient) -> Arc<Self> {
        let service = Arc::new(Self { client });
        service.client.set_token_refresher(&service);
        service
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Log in and store the issued tokens.
    pub async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<AuthPayload>, ApiError> {
        let body = validated(request, &CommonSchemas::login())?;
        let response: ApiResponse<AuthPayload> = self
            .client
            .post(ServiceName::Auth, "login")
            .json(&body)
            .send()
            .await?;
        self.store_session(&response).await?;
        Ok(response)
    }

    /// Create an account and store the issued tokens.
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<ApiResponse<AuthPayload>, ApiError> {
        let body = validated(request, &CommonSchemas::register())?;
        let response: ApiResponse<AuthPayload> = self
            .client
            .post(ServiceName::Auth, "register")
            .json(&body)
            .send()
            .await?;
        self.store_session(&response).await?;
        Ok(response)
    }

    pub async fn validate_username(&self, username: &str) -> Result<UsernameAvailability, ApiError> {
        let schema = ValidationSchema::new().field(CommonSchemas::username());
        let body = validated(&json!({ "username": username }), &schema)?;
        let username = body
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let response: ApiResponse<UsernameAvailability> = self
            .client
            .get(ServiceName::Auth, "validate-username")
            .query("username", username)
            .dedupe()
            .send()
            .await?;
        required_data(response)
    }

    /// Send a one-time code to `phone`.
    pub async fn generate_otp(&self, phone: &str) -> Result<ApiResponse<Value>, ApiError> {
        let schema = ValidationSchema::new().field(CommonSchemas::phone().required());
        let body = validated(&json!({ "phone": phone }), &schema)?;
        self.client
            .post(ServiceName::Auth, "generate-otp")
            .json(&body)
            .send()
            .await
    }

    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<ApiResponse<Value>, ApiError> {
        let schema = ValidationSchema::new()
            .field(CommonSchemas::phone().required())
            .field(CommonSchemas::otp());
        let body = validated(&json!({ "phone": phone, "otp": otp }), &schema)?;
        self.client
            .post(ServiceName::Auth, "verify-otp")
            .json(&body)
            .send()
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<ApiResponse<Value>, ApiError> {
        let schema = ValidationSchema::new().field(CommonSchemas::email());
        let body = validated(&json!({ "email": email }), &schema)?;
        self.client
            .post(ServiceName::Auth, "forgot-password")
            .json(&body)
            .send()
            .await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let schema = ValidationSchema::new()
            .field(CommonSchemas::email())
            .field(CommonSchemas::otp())
            .field(CommonSchemas::password());
        let body = validated(request, &schema)?;
        self.client
            .post(ServiceName::Auth, "reset-password")
            .json(&body)
            .send()
            .await
    }

    /// Exchange a refresh token for a new token pair. Not retried.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        let response: ApiResponse<AuthTokens> = self
            .client
            .post(ServiceName::Auth, "refresh-token")
            .json(&json!({ "refreshToken": refresh_token }))
            .retries(0)
            .send()
            .await?;
        required_data(response)
    }

    /// End the session. The server call is best effort; local tokens and
    /// pending optimized requests are always cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(e) = self
            .client
            .post(ServiceName::Auth, "logout")
            .retries(0)
            .send::<Value>()
            .await
        {
            debug!(code = %e.code(), "logout request failed");
        }

        if let Some(optimizer) = self.client.optimizer() {
            optimizer.clear();
        }
        self.client
            .token_store()
            .clear_tokens()
            .await
            .map_err(|e| ApiError::new(ErrorKind::UnknownError, e.to_string()))
    }

    /// Whether an access token is stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.client.token_store().get_access_token().await, Ok(Some(_)))
    }

    async fn store_session(&self, response: &ApiResponse<AuthPayload>) -> Result<(), ApiError> {
        let Some(payload) = &response.data else {
            return Ok(());
        };
        self.client
            .token_store()
            .store_tokens(&payload.tokens)
            .await
            .map_err(|e| ApiError::new(ErrorKind::UnknownError, e.to_string()))
    }
}

#[async_trait]
impl TokenRefresher for AuthService {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        AuthService::refresh(self, refresh_token).await
    }
}

fn required_data<T>(response: ApiResponse<T>) -> Result<T, ApiError> {
    response.into_data().ok_or_else(|| {
        ApiError::new(ErrorKind::UnknownError, "Response envelope carried no data")
    })
}

//! User service caller.

use crate::models::{UpdateProfileRequest, User};
use crate::validated;
use courier_core::{ApiError, ApiResponse, ErrorKind, ServiceName};
use courier_http_client::HttpClient;
use courier_validation::{CommonSchemas, FieldRule, ValidationSchema};

/// Profile access for the signed-in user.
#[derive(Debug, Clone)]
pub struct UserService {
    client: HttpClient,
}

impl UserService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        let response: ApiResponse<User> = self
            .client
            .get(ServiceName::User, "profile")
            .dedupe()
            .send()
            .await?;
        into_user(response)
    }

    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<User, ApiError> {
        let body = validated(update, &update_schema())?;
        let response: ApiResponse<User> = self
            .client
            .put(ServiceName::User, "profile")
            .json(&body)
            .send()
            .await?;
        into_user(response)
    }
}

fn update_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field(FieldRule::for_field("firstName").length(1, 50))
        .field(FieldRule::for_field("lastName").length(1, 50))
        .field(CommonSchemas::phone())
        .field(FieldRule::for_field("bio").max_length(160))
}

fn into_user(response: ApiResponse<User>) -> Result<User, ApiError> {
    response
        .into_data()
        .ok_or_else(|| ApiError::new(ErrorKind::UserNotFound, "Profile missing from response"))
}

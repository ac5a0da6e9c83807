//! REST gateway models for request and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    convert::{ConversionError, datetime_to_timestamp, timestamp_to_datetime},
    proto::users::v1 as pb,
};

pub mod user_request;

pub use user_request::UserRequest;

/// Body of `POST /v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserPayload {
    /// Zero lets the database assign the id.
    #[serde(default)]
    pub id_user: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub done_at: Option<DateTime<Utc>>,
}

impl From<CreateUserPayload> for pb::CreateUserRequest {
    fn from(payload: CreateUserPayload) -> Self {
        Self {
            id_user: payload.id_user,
            name: payload.name,
            email: payload.email,
            created_at: None,
            updated_at: payload.updated_at.map(datetime_to_timestamp),
            deleted_at: payload.deleted_at.map(datetime_to_timestamp),
            done_at: payload.done_at.map(datetime_to_timestamp),
        }
    }
}

/// Body of `PUT /v1/users/:id`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Query string of `GET /v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct ListUserQuery {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// JSON view of one user request; unset timestamps are omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<pb::User> for UserResponse {
    type Error = ConversionError;

    fn try_from(user: pb::User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: timestamp_to_datetime(user.created_at.as_ref())?,
            updated_at: timestamp_to_datetime(user.updated_at.as_ref())?,
            done_at: timestamp_to_datetime(user.done_at.as_ref())?,
            deleted_at: timestamp_to_datetime(user.deleted_at.as_ref())?,
        })
    }
}

pub fn users_from_pb(users: Vec<pb::User>) -> Result<Vec<UserResponse>, ConversionError> {
    users.into_iter().map(UserResponse::try_from).collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id_user: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetUsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub items: Vec<UserResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveUserResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub updated: bool,
}

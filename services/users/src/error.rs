//! Custom error types for the users service

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tonic::{Code, Status};

use crate::convert::ConversionError;

/// Errors produced by the service layer
///
/// The `Not*` variants describe statements that succeeded but touched no
/// rows; `Database` is a technical failure of the named operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("unable to create user request")]
    NotCreated,

    #[error("unable to get list of user requests")]
    NotFound,

    #[error("user request with this id does not exist")]
    NotExists,

    #[error("unable to remove user request")]
    NotRemoved,

    #[error("unable to update user of user request")]
    NotUpdated,

    #[error("{operation} failed")]
    Database {
        operation: &'static str,
        #[source]
        source: DatabaseError,
    },
}

impl ServiceError {
    pub fn database(operation: &'static str) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self::Database { operation, source }
    }
}

/// Begin/commit failures of the transaction helper.
impl From<DatabaseError> for ServiceError {
    fn from(source: DatabaseError) -> Self {
        Self::Database {
            operation: "transaction",
            source,
        }
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for Status {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound | ServiceError::NotExists => Status::not_found(err.to_string()),
            ServiceError::NotRemoved | ServiceError::NotUpdated => {
                Status::failed_precondition(err.to_string())
            }
            ServiceError::NotCreated => Status::internal(err.to_string()),
            ServiceError::Database { .. } => Status::internal("database error"),
        }
    }
}

impl From<ConversionError> for Status {
    fn from(err: ConversionError) -> Self {
        Status::internal(err.to_string())
    }
}

/// Error type of the REST gateway
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                ApiError::BadRequest(status.message().to_string())
            }
            Code::NotFound => ApiError::NotFound(status.message().to_string()),
            _ => ApiError::InternalServerError,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

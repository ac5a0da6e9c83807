//! REST gateway routes
//!
//! Every `/v1/users` handler builds the protobuf request, calls the gRPC
//! adapter in-process and maps the reply (or its status) to JSON.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tonic::Request;
use tower_http::trace::TraceLayer;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        CreateUserPayload, CreateUserResponse, GetUsersResponse, ListUserQuery, ListUsersResponse,
        RemoveUserResponse, UpdateUserPayload, UpdateUserResponse, users_from_pb,
    },
    proto::users::v1::{self as pb, user_service_server::UserService},
    state::AppState,
};

/// Create the router for the REST gateway
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .route("/v1/users", post(create_user).get(list_users))
        .route(
            "/v1/users/:ids",
            get(get_users).delete(remove_users).put(update_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint, backed by a database probe
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = matches!(
        common::database::health_check(&state.db_pool).await,
        Ok(true)
    );

    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "users"
        })),
    )
}

/// Readiness endpoint; flips once both listeners are serving
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({ "ready": true })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ready": false })))
    }
}

/// Parse a comma-separated id list such as `1,2,3`
fn parse_ids(raw: &str) -> ApiResult<Vec<u64>> {
    raw.split(',')
        .map(|part| parse_id(part.trim()))
        .collect()
}

fn parse_id(raw: &str) -> ApiResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid user id: {raw:?}")))
}

fn render_users(users: Vec<pb::User>) -> ApiResult<Vec<crate::models::UserResponse>> {
    users_from_pb(users).map_err(|e| {
        tracing::error!("Failed to render users: {}", e);
        ApiError::InternalServerError
    })
}

/// Create a new user request
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let response = state
        .api
        .create_user(Request::new(payload.into()))
        .await?
        .into_inner();

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            id_user: response.id_user,
        }),
    ))
}

/// Get user requests by id
pub async fn get_users(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ids_user = parse_ids(&ids)?;
    let response = state
        .api
        .get_user_by_id(Request::new(pb::GetUserByIdRequest { ids_user }))
        .await?
        .into_inner();

    Ok(Json(GetUsersResponse {
        users: render_users(response.users)?,
    }))
}

/// List one page of user requests
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUserQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let response = state
        .api
        .list_user(Request::new(pb::ListUserRequest {
            limit: query.limit,
            offset: query.offset,
        }))
        .await?
        .into_inner();

    Ok(Json(ListUsersResponse {
        items: render_users(response.items)?,
    }))
}

/// Soft-delete user requests by id
pub async fn remove_users(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ids_user = parse_ids(&ids)?;
    let response = state
        .api
        .remove_user(Request::new(pb::RemoveUserRequest { ids_user }))
        .await?
        .into_inner();

    Ok(Json(RemoveUserResponse {
        removed: response.removed,
    }))
}

/// Replace the name and email of a user request
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id_user = parse_id(&id)?;
    let Json(payload) = payload?;
    let response = state
        .api
        .update_user_by_id(Request::new(pb::UpdateUserByIdRequest {
            id_user,
            name: payload.name,
            email: payload.email,
        }))
        .await?
        .into_inner();

    Ok(Json(UpdateUserResponse {
        updated: response.updated,
    }))
}

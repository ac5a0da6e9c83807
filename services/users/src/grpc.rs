//! gRPC adapter for the user request service
//!
//! Each RPC validates its message, converts it to the domain model, calls
//! the service and converts the outcome back. Every outcome is logged inside
//! a span named after the RPC.

use std::sync::Arc;

use chrono::Utc;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};

use crate::{
    convert::{user_request_from_pb, users_to_pb},
    proto::users::v1::{
        self as pb,
        user_service_server::{UserService, UserServiceServer},
    },
    service::UserRequestService,
    validation,
};

/// gRPC service implementation that wraps a [`UserRequestService`]
pub struct UserApi {
    service: Arc<dyn UserRequestService>,
}

impl UserApi {
    pub fn new(service: Arc<dyn UserRequestService>) -> Self {
        Self { service }
    }
}

fn invalid_argument(message: String) -> Status {
    warn!(error = %message, "invalid argument");
    Status::invalid_argument(message)
}

#[tonic::async_trait]
impl UserService for UserApi {
    #[instrument(name = "CreateUser", skip_all)]
    async fn create_user(
        &self,
        request: Request<pb::CreateUserRequest>,
    ) -> Result<Response<pb::CreateUserResponse>, Status> {
        let req = request.into_inner();
        validation::validate_create(&req).map_err(invalid_argument)?;

        let user = user_request_from_pb(&req, Utc::now()).map_err(|e| {
            error!(error = ?e, "unable to convert message to user request");
            Status::from(e)
        })?;

        let id = self.service.create_user_request(user).await.map_err(|e| {
            error!(
                error = ?e,
                id_user = req.id_user,
                name = %req.name,
                email = %req.email,
                updated_at = ?req.updated_at,
                deleted_at = ?req.deleted_at,
                done_at = ?req.done_at,
                "create_user_request failed"
            );
            Status::from(e)
        })?;

        info!(id_user = id, "success");
        Ok(Response::new(pb::CreateUserResponse { id_user: id }))
    }

    #[instrument(name = "GetUserById", skip_all)]
    async fn get_user_by_id(
        &self,
        request: Request<pb::GetUserByIdRequest>,
    ) -> Result<Response<pb::GetUserByIdResponse>, Status> {
        let req = request.into_inner();
        validation::validate_get(&req).map_err(invalid_argument)?;

        let users = self
            .service
            .get_user_by_ids(req.ids_user.clone())
            .await
            .map_err(|e| {
                error!(error = ?e, ids_user = ?req.ids_user, "get_user_by_ids failed");
                Status::from(e)
            })?;

        info!(ids_user = ?req.ids_user, found = users.len(), "success");
        Ok(Response::new(pb::GetUserByIdResponse {
            users: users_to_pb(&users),
        }))
    }

    #[instrument(name = "ListUser", skip_all)]
    async fn list_user(
        &self,
        request: Request<pb::ListUserRequest>,
    ) -> Result<Response<pb::ListUserResponse>, Status> {
        let req = request.into_inner();
        validation::validate_list(&req).map_err(invalid_argument)?;

        let users = self
            .service
            .list_user_requests(req.limit, req.offset)
            .await
            .map_err(|e| {
                error!(error = ?e, limit = req.limit, offset = req.offset, "list_user_requests failed");
                Status::from(e)
            })?;

        info!(limit = req.limit, offset = req.offset, found = users.len(), "success");
        Ok(Response::new(pb::ListUserResponse {
            items: users_to_pb(&users),
        }))
    }

    #[instrument(name = "RemoveUser", skip_all)]
    async fn remove_user(
        &self,
        request: Request<pb::RemoveUserRequest>,
    ) -> Result<Response<pb::RemoveUserResponse>, Status> {
        let req = request.into_inner();
        validation::validate_remove(&req).map_err(invalid_argument)?;

        let removed = self
            .service
            .remove_user_requests(req.ids_user.clone())
            .await
            .map_err(|e| {
                error!(error = ?e, ids_user = ?req.ids_user, "remove_user_requests failed");
                Status::from(e)
            })?;

        info!(ids_user = ?req.ids_user, "success");
        Ok(Response::new(pb::RemoveUserResponse { removed }))
    }

    #[instrument(name = "UpdateUserById", skip_all)]
    async fn update_user_by_id(
        &self,
        request: Request<pb::UpdateUserByIdRequest>,
    ) -> Result<Response<pb::UpdateUserByIdResponse>, Status> {
        let req = request.into_inner();
        validation::validate_update(&req).map_err(invalid_argument)?;

        let updated = self
            .service
            .update_user_by_id(req.id_user, req.name.clone(), req.email.clone())
            .await
            .map_err(|e| {
                error!(
                    error = ?e,
                    id_user = req.id_user,
                    name = %req.name,
                    email = %req.email,
                    "update_user_by_id failed"
                );
                Status::from(e)
            })?;

        info!(id_user = req.id_user, "success");
        Ok(Response::new(pb::UpdateUserByIdResponse { updated }))
    }
}

/// Create a UserService server around a shared adapter
pub fn make_user_service(api: Arc<UserApi>) -> UserServiceServer<UserApi> {
    UserServiceServer::from_arc(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::UserRequest, service::testing::FakeUserRequestService};
    use tonic::Code;

    fn api(service: Arc<FakeUserRequestService>) -> UserApi {
        UserApi::new(service)
    }

    fn create_request(id: u64, name: &str, email: &str) -> Request<pb::CreateUserRequest> {
        Request::new(pb::CreateUserRequest {
            id_user: id,
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn create_user_returns_id() {
        let service = Arc::new(FakeUserRequestService::default());
        let response = api(service.clone())
            .create_user(create_request(1, "A", "a@x.com"))
            .await
            .unwrap();

        assert_eq!(response.into_inner().id_user, 1);
        let stored = service.users();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "A");
    }

    #[tokio::test]
    async fn create_user_with_empty_name_is_rejected_without_side_effects() {
        let service = Arc::new(FakeUserRequestService::default());
        let status = api(service.clone())
            .create_user(create_request(1, "", "a@x.com"))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(service.calls(), 0);
        assert!(service.users().is_empty());
    }

    #[tokio::test]
    async fn create_user_with_invalid_timestamp_is_internal() {
        let service = Arc::new(FakeUserRequestService::default());
        let mut request = create_request(0, "A", "a@x.com");
        request.get_mut().done_at = Some(prost_types::Timestamp {
            seconds: 5,
            nanos: -3,
        });

        let status = api(service.clone()).create_user(request).await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn get_user_by_id_requires_ids() {
        let service = Arc::new(FakeUserRequestService::default());
        let status = api(service.clone())
            .get_user_by_id(Request::new(pb::GetUserByIdRequest { ids_user: vec![] }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn ids_beyond_bigint_are_invalid_arguments() {
        let service = Arc::new(FakeUserRequestService::default());
        let api = api(service.clone());

        let status = api
            .get_user_by_id(Request::new(pb::GetUserByIdRequest {
                ids_user: vec![u64::MAX],
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = api
            .create_user(create_request(u64::MAX, "A", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = api
            .update_user_by_id(Request::new(pb::UpdateUserByIdRequest {
                id_user: i64::MAX as u64 + 1,
                name: "B".to_string(),
                email: "b@x.com".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn get_user_by_id_maps_records() {
        let mut user = UserRequest::new("A", "a@x.com", Utc::now());
        user.id = 4;
        let service = Arc::new(FakeUserRequestService::with_users(vec![user]));

        let response = api(service)
            .get_user_by_id(Request::new(pb::GetUserByIdRequest { ids_user: vec![4] }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.users.len(), 1);
        assert_eq!(response.users[0].id, 4);
        assert_eq!(response.users[0].email, "a@x.com");
    }

    #[tokio::test]
    async fn remove_twice_fails_the_second_time() {
        let service = Arc::new(FakeUserRequestService::default());
        let api = api(service);
        api.create_user(create_request(1, "A", "a@x.com")).await.unwrap();

        let removed = api
            .remove_user(Request::new(pb::RemoveUserRequest { ids_user: vec![1] }))
            .await
            .unwrap()
            .into_inner();
        assert!(removed.removed);

        let status = api
            .remove_user(Request::new(pb::RemoveUserRequest { ids_user: vec![1] }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::FailedPrecondition);

        let status = api
            .list_user(Request::new(pb::ListUserRequest {
                limit: 10,
                offset: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn list_user_rejects_zero_limit() {
        let service = Arc::new(FakeUserRequestService::default());
        let status = api(service.clone())
            .list_user(Request::new(pb::ListUserRequest {
                limit: 0,
                offset: 0,
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn update_missing_user_is_failed_precondition() {
        let service = Arc::new(FakeUserRequestService::default());
        let status = api(service)
            .update_user_by_id(Request::new(pb::UpdateUserByIdRequest {
                id_user: 42,
                name: "B".to_string(),
                email: "b@x.com".to_string(),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn database_failures_are_internal() {
        let service = Arc::new(FakeUserRequestService::failing());
        let status = api(service)
            .list_user(Request::new(pb::ListUserRequest {
                limit: 5,
                offset: 0,
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "database error");
    }
}

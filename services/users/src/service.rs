//! User request service
//!
//! Business rules on top of the repository: every write runs in its own
//! transaction, and a statement that touches no rows is reported as a
//! domain error rather than a success.

use async_trait::async_trait;
use common::database::with_tx;
use sqlx::PgPool;

use crate::{
    error::{ServiceError, ServiceResult},
    models::UserRequest,
    repositories::{UserRequestRepository, statements},
};

/// Operations offered to the API layer
#[async_trait]
pub trait UserRequestService: Send + Sync {
    /// Persist a new user request and return its id.
    async fn create_user_request(&self, user: UserRequest) -> ServiceResult<u64>;

    /// Live user requests among `ids`; none found is [`ServiceError::NotFound`].
    async fn get_user_by_ids(&self, ids: Vec<u64>) -> ServiceResult<Vec<UserRequest>>;

    /// One page of live user requests; an empty page is [`ServiceError::NotFound`].
    async fn list_user_requests(&self, limit: u64, offset: u64) -> ServiceResult<Vec<UserRequest>>;

    /// Soft-delete user requests; nothing removed is [`ServiceError::NotRemoved`].
    async fn remove_user_requests(&self, ids: Vec<u64>) -> ServiceResult<bool>;

    /// Probe for a live user request; absence is [`ServiceError::NotExists`].
    async fn check_exists(&self, id: u64) -> ServiceResult<bool>;

    /// Replace name and email; nothing updated is [`ServiceError::NotUpdated`].
    async fn update_user_by_id(&self, id: u64, name: String, email: String)
    -> ServiceResult<bool>;
}

/// PostgreSQL-backed implementation of [`UserRequestService`]
#[derive(Clone)]
pub struct PgUserRequestService {
    pool: PgPool,
    repository: UserRequestRepository,
}

impl PgUserRequestService {
    pub fn new(pool: PgPool, repository: UserRequestRepository) -> Self {
        Self { pool, repository }
    }
}

#[async_trait]
impl UserRequestService for PgUserRequestService {
    async fn create_user_request(&self, user: UserRequest) -> ServiceResult<u64> {
        // Built before BEGIN: an unencodable statement never reaches the database.
        let insert =
            statements::insert(&user).map_err(ServiceError::database("repository.create"))?;
        let supplied_id = user.id != 0;
        let repository = self.repository.clone();

        with_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let id = repository
                    .insert(insert, Some(&mut *conn))
                    .await
                    .map_err(ServiceError::database("repository.create"))?;

                let id = match id {
                    Some(id) if id != 0 => id,
                    _ => return Err(ServiceError::NotCreated),
                };

                if supplied_id {
                    repository
                        .advance_id_sequence(id, Some(conn))
                        .await
                        .map_err(ServiceError::database("repository.advance_id_sequence"))?;
                }

                Ok(id)
            })
        })
        .await
    }

    async fn get_user_by_ids(&self, ids: Vec<u64>) -> ServiceResult<Vec<UserRequest>> {
        let users = self
            .repository
            .get_by_ids(&ids)
            .await
            .map_err(ServiceError::database("repository.get_by_ids"))?;

        if users.is_empty() {
            return Err(ServiceError::NotFound);
        }

        Ok(users)
    }

    async fn list_user_requests(&self, limit: u64, offset: u64) -> ServiceResult<Vec<UserRequest>> {
        let users = self
            .repository
            .list(limit, offset)
            .await
            .map_err(ServiceError::database("repository.list"))?;

        if users.is_empty() {
            return Err(ServiceError::NotFound);
        }

        Ok(users)
    }

    async fn remove_user_requests(&self, ids: Vec<u64>) -> ServiceResult<bool> {
        let repository = self.repository.clone();

        with_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let removed = repository
                    .remove(&ids, Some(conn))
                    .await
                    .map_err(ServiceError::database("repository.remove"))?;

                if removed {
                    Ok(true)
                } else {
                    Err(ServiceError::NotRemoved)
                }
            })
        })
        .await
    }

    async fn check_exists(&self, id: u64) -> ServiceResult<bool> {
        let exists = self
            .repository
            .exists(id)
            .await
            .map_err(ServiceError::database("repository.exists"))?;

        if !exists {
            return Err(ServiceError::NotExists);
        }

        Ok(true)
    }

    async fn update_user_by_id(
        &self,
        id: u64,
        name: String,
        email: String,
    ) -> ServiceResult<bool> {
        let repository = self.repository.clone();

        with_tx(&self.pool, move |conn| {
            Box::pin(async move {
                let updated = repository
                    .update(id, &name, &email, Some(conn))
                    .await
                    .map_err(ServiceError::database("repository.update"))?;

                if updated {
                    Ok(true)
                } else {
                    Err(ServiceError::NotUpdated)
                }
            })
        })
        .await
    }
}

//! User request repository for database operations

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::statements;
use crate::models::UserRequest;

/// User request repository
///
/// Mutating operations take an optional connection borrowed from an open
/// transaction; without one they run directly against the pool.
#[derive(Clone)]
pub struct UserRequestRepository {
    pool: PgPool,
}

impl UserRequestRepository {
    /// Create a new user request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user request and return the id the database reports, if any.
    pub async fn create(
        &self,
        user: &UserRequest,
        tx: Option<&mut PgConnection>,
    ) -> DatabaseResult<Option<u64>> {
        let builder = statements::insert(user)?;
        self.insert(builder, tx).await
    }

    /// Run an insert built by [`statements::insert`].
    pub async fn insert(
        &self,
        mut builder: QueryBuilder<'static, Postgres>,
        tx: Option<&mut PgConnection>,
    ) -> DatabaseResult<Option<u64>> {
        let query = builder.build_query_scalar::<i64>();

        let id = match tx {
            Some(conn) => query.fetch_optional(conn).await,
            None => query.fetch_optional(&self.pool).await,
        }
        .map_err(DatabaseError::Query)?;

        let id = id
            .map(|id| {
                u64::try_from(id).map_err(|_| {
                    DatabaseError::Query(sqlx::Error::Decode(
                        format!("negative id_user {} returned by insert", id).into(),
                    ))
                })
            })
            .transpose()?;

        debug!(?id, "Inserted user request");
        Ok(id)
    }

    /// Keep database-assigned ids above `id` after an insert with an explicit id.
    pub async fn advance_id_sequence(
        &self,
        id: u64,
        tx: Option<&mut PgConnection>,
    ) -> DatabaseResult<()> {
        let mut builder = statements::advance_id_sequence(id)?;
        let query = builder.build_query_scalar::<i64>();

        let next = match tx {
            Some(conn) => query.fetch_one(conn).await,
            None => query.fetch_one(&self.pool).await,
        }
        .map_err(DatabaseError::Query)?;

        debug!(id, next, "Advanced id_user sequence");
        Ok(())
    }

    /// Fetch the live user requests among `ids`, ordered by id.
    pub async fn get_by_ids(&self, ids: &[u64]) -> DatabaseResult<Vec<UserRequest>> {
        let mut builder = statements::select_by_ids(ids)?;

        builder
            .build_query_as::<UserRequest>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// One page of live user requests, ordered by id.
    pub async fn list(&self, limit: u64, offset: u64) -> DatabaseResult<Vec<UserRequest>> {
        let mut builder = statements::select_page(limit, offset)?;

        builder
            .build_query_as::<UserRequest>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Soft-delete the live user requests among `ids`.
    ///
    /// Returns whether at least one row was affected.
    pub async fn remove(&self, ids: &[u64], tx: Option<&mut PgConnection>) -> DatabaseResult<bool> {
        let mut builder = statements::soft_delete(ids, Utc::now())?;
        let query = builder.build();

        let result = match tx {
            Some(conn) => query.execute(conn).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(DatabaseError::Query)?;

        debug!(rows = result.rows_affected(), "Soft-deleted user requests");
        Ok(result.rows_affected() > 0)
    }

    /// Replace name and email of a live user request and stamp `updated_at`.
    pub async fn update(
        &self,
        id: u64,
        name: &str,
        email: &str,
        tx: Option<&mut PgConnection>,
    ) -> DatabaseResult<bool> {
        let mut builder = statements::update(id, name, email, Utc::now())?;
        let query = builder.build();

        let result = match tx {
            Some(conn) => query.execute(conn).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a live user request with `id` exists.
    pub async fn exists(&self, id: u64) -> DatabaseResult<bool> {
        let mut builder = statements::exists(id)?;

        builder
            .build_query_scalar::<bool>()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }
}

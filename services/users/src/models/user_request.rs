//! User request model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User request entity, one row of the `users` table.
///
/// A row whose `deleted_at` is set is logically absent and is never returned
/// by the repository.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRequest {
    /// Zero until the database has assigned an id.
    #[sqlx(rename = "id_user", try_from = "i64")]
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub done_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRequest {
    /// New, not yet persisted user request stamped with `created_at`.
    pub fn new(name: impl Into<String>, email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            created_at,
            updated_at: None,
            done_at: None,
            deleted_at: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

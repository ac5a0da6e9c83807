//! Statement builders for the `users` table
//!
//! Every builder validates its inputs first, so a statement that cannot be
//! represented in SQL fails here and is never sent to the database.

use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Postgres, QueryBuilder};

use crate::models::UserRequest;

const SELECT_USERS: &str =
    "SELECT id_user, name, email, created_at, updated_at, done_at, deleted_at FROM users";

fn to_bigint(value: u64, what: &str) -> DatabaseResult<i64> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::Statement(format!("{} {} exceeds the BIGINT range", what, value)))
}

fn to_bigints(ids: &[u64]) -> DatabaseResult<Vec<i64>> {
    if ids.is_empty() {
        return Err(DatabaseError::Statement("empty id set".to_string()));
    }

    ids.iter().map(|id| to_bigint(*id, "id")).collect()
}

/// `INSERT ... RETURNING id_user`; a zero id is left to the database.
pub fn insert(user: &UserRequest) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let id = match user.id {
        0 => None,
        id => Some(to_bigint(id, "id")?),
    };

    let mut builder = QueryBuilder::new("INSERT INTO users (");
    {
        let mut columns = builder.separated(", ");
        if id.is_some() {
            columns.push("id_user");
        }
        columns
            .push("name")
            .push("email")
            .push("created_at")
            .push("updated_at")
            .push("deleted_at")
            .push("done_at");
    }

    builder.push(") VALUES (");
    {
        let mut values = builder.separated(", ");
        if let Some(id) = id {
            values.push_bind(id);
        }
        values
            .push_bind(user.name.clone())
            .push_bind(user.email.clone())
            .push_bind(user.created_at)
            .push_bind(user.updated_at)
            .push_bind(user.deleted_at)
            .push_bind(user.done_at);
    }
    builder.push(") RETURNING id_user");

    Ok(builder)
}

/// Raise the `id_user` identity sequence to at least `id` and to every stored
/// id, so the next database-assigned id is free.
pub fn advance_id_sequence(id: u64) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let id = to_bigint(id, "id")?;

    let mut builder = QueryBuilder::new(
        "SELECT setval(pg_get_serial_sequence('users', 'id_user'), GREATEST(",
    );
    builder
        .push_bind(id)
        .push(
            ", nextval(pg_get_serial_sequence('users', 'id_user')), \
             COALESCE((SELECT MAX(id_user) FROM users), 0)))",
        );

    Ok(builder)
}

pub fn select_by_ids(ids: &[u64]) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let ids = to_bigints(ids)?;

    let mut builder = QueryBuilder::new(SELECT_USERS);
    builder
        .push(" WHERE id_user = ANY(")
        .push_bind(ids)
        .push(") AND deleted_at IS NULL ORDER BY id_user ASC");

    Ok(builder)
}

pub fn select_page(limit: u64, offset: u64) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let limit = to_bigint(limit, "limit")?;
    let offset = to_bigint(offset, "offset")?;

    let mut builder = QueryBuilder::new(SELECT_USERS);
    builder
        .push(" WHERE deleted_at IS NULL ORDER BY id_user ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    Ok(builder)
}

pub fn soft_delete(
    ids: &[u64],
    deleted_at: DateTime<Utc>,
) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let ids = to_bigints(ids)?;

    let mut builder = QueryBuilder::new("UPDATE users SET deleted_at = ");
    builder
        .push_bind(deleted_at)
        .push(" WHERE id_user = ANY(")
        .push_bind(ids)
        .push(") AND deleted_at IS NULL");

    Ok(builder)
}

pub fn update(
    id: u64,
    name: &str,
    email: &str,
    updated_at: DateTime<Utc>,
) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let id = to_bigint(id, "id")?;

    let mut builder = QueryBuilder::new("UPDATE users SET updated_at = ");
    builder
        .push_bind(updated_at)
        .push(", name = ")
        .push_bind(name.to_string())
        .push(", email = ")
        .push_bind(email.to_string())
        .push(" WHERE id_user = ")
        .push_bind(id)
        .push(" AND deleted_at IS NULL");

    Ok(builder)
}

pub fn exists(id: u64) -> DatabaseResult<QueryBuilder<'static, Postgres>> {
    let id = to_bigint(id, "id")?;

    let mut builder = QueryBuilder::new("SELECT EXISTS (SELECT 1 FROM users WHERE id_user = ");
    builder.push_bind(id).push(" AND deleted_at IS NULL)");

    Ok(builder)
}

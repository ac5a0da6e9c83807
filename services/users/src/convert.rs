//! Mapping between protobuf messages and the domain model

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use thiserror::Error;

use crate::{models::UserRequest, proto::users::v1 as pb};

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Error raised when a wire value has no domain representation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConversionError {
    #[error("timestamp out of range: {seconds}s {nanos}ns")]
    TimestampOutOfRange { seconds: i64, nanos: i32 },
}

/// Absent and zero-valued timestamps both map to `None`.
pub fn timestamp_to_datetime(
    timestamp: Option<&Timestamp>,
) -> Result<Option<DateTime<Utc>>, ConversionError> {
    let Some(ts) = timestamp else {
        return Ok(None);
    };

    if ts.seconds == 0 && ts.nanos == 0 {
        return Ok(None);
    }

    if !(0..NANOS_PER_SECOND).contains(&ts.nanos) {
        return Err(ConversionError::TimestampOutOfRange {
            seconds: ts.seconds,
            nanos: ts.nanos,
        });
    }

    DateTime::from_timestamp(ts.seconds, ts.nanos as u32)
        .map(Some)
        .ok_or(ConversionError::TimestampOutOfRange {
            seconds: ts.seconds,
            nanos: ts.nanos,
        })
}

pub fn datetime_to_timestamp(datetime: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: datetime.timestamp(),
        nanos: datetime.timestamp_subsec_nanos() as i32,
    }
}

/// Build the domain record for a create request.
///
/// The wire `created_at` is ignored; the record is stamped with `created_at`.
pub fn user_request_from_pb(
    request: &pb::CreateUserRequest,
    created_at: DateTime<Utc>,
) -> Result<UserRequest, ConversionError> {
    Ok(UserRequest {
        id: request.id_user,
        name: request.name.clone(),
        email: request.email.clone(),
        created_at,
        updated_at: timestamp_to_datetime(request.updated_at.as_ref())?,
        done_at: timestamp_to_datetime(request.done_at.as_ref())?,
        deleted_at: timestamp_to_datetime(request.deleted_at.as_ref())?,
    })
}

impl From<&UserRequest> for pb::User {
    fn from(user: &UserRequest) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Some(datetime_to_timestamp(user.created_at)),
            updated_at: user.updated_at.map(datetime_to_timestamp),
            done_at: user.done_at.map(datetime_to_timestamp),
            deleted_at: user.deleted_at.map(datetime_to_timestamp),
        }
    }
}

pub fn users_to_pb(users: &[UserRequest]) -> Vec<pb::User> {
    users.iter().map(pb::User::from).collect()
}

//! Input validation for the inbound RPC messages

use regex::Regex;
use std::sync::OnceLock;

use crate::proto::users::v1 as pb;

/// Upper bound for `ListUser.limit`
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Upper bound for the size of an id set
pub const MAX_IDS: usize = 1000;

/// Largest id the `BIGINT` column can hold
pub const MAX_ID: u64 = i64::MAX as u64;

/// Validate name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() > 255 {
        return Err("Name must be at most 255 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a single user id
pub fn validate_id(id: u64) -> Result<(), String> {
    if id == 0 {
        return Err("User id must be greater than 0".to_string());
    }

    if id > MAX_ID {
        return Err(format!("User id must be at most {}", MAX_ID));
    }

    Ok(())
}

/// Validate a set of user ids
pub fn validate_ids(ids: &[u64]) -> Result<(), String> {
    if ids.is_empty() {
        return Err("At least one user id is required".to_string());
    }

    if ids.len() > MAX_IDS {
        return Err(format!("At most {} user ids are allowed", MAX_IDS));
    }

    ids.iter().try_for_each(|id| validate_id(*id))
}

/// Validate pagination bounds
pub fn validate_pagination(limit: u64, offset: u64) -> Result<(), String> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(format!("Limit must be between 1 and {}", MAX_PAGE_SIZE));
    }

    if offset > MAX_ID {
        return Err("Offset is out of range".to_string());
    }

    Ok(())
}

/// A zero `id_user` is valid and lets the database assign the id.
pub fn validate_create(request: &pb::CreateUserRequest) -> Result<(), String> {
    if request.id_user != 0 {
        validate_id(request.id_user)?;
    }
    validate_name(&request.name)?;
    validate_email(&request.email)
}

pub fn validate_get(request: &pb::GetUserByIdRequest) -> Result<(), String> {
    validate_ids(&request.ids_user)
}

pub fn validate_list(request: &pb::ListUserRequest) -> Result<(), String> {
    validate_pagination(request.limit, request.offset)
}

pub fn validate_remove(request: &pb::RemoveUserRequest) -> Result<(), String> {
    validate_ids(&request.ids_user)
}

pub fn validate_update(request: &pb::UpdateUserByIdRequest) -> Result<(), String> {
    validate_id(request.id_user)?;
    validate_name(&request.name)?;
    validate_email(&request.email)
}

//! Custom error types for the common library
//!
//! This module defines the persistence-level error type shared by the
//! repositories and the transaction helper.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while beginning or committing a transaction
    #[error("Database transaction error: {0}")]
    Transaction(#[source] SqlxError),

    /// A statement could not be built from its inputs; nothing was sent
    #[error("Invalid statement: {0}")]
    Statement(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

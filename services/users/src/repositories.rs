//! Repositories for database operations

pub mod statements;
pub mod user_request;

pub use user_request::UserRequestRepository;

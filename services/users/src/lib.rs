//! Users service
//!
//! CRUD over user requests stored in the PostgreSQL `users` table, exposed
//! as the `users.v1.UserService` gRPC service and mirrored by a JSON REST
//! gateway under `/v1/users`.

pub mod proto {
    pub mod users {
        pub mod v1 {
            tonic::include_proto!("users.v1");
        }
    }
}

pub mod config;
pub mod convert;
pub mod error;
pub mod grpc;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod server;
pub mod service;
pub mod state;
pub mod validation;

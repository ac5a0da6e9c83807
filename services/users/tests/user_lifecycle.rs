//! End-to-end tests of the users service against PostgreSQL
//!
//! These tests need a PostgreSQL instance reachable through `DATABASE_URL`
//! and are run with `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::Utc;
use common::database::{DatabaseConfig, health_check, init_pool};
use serial_test::serial;
use sqlx::PgPool;
use tonic::{Code, Request};
use users::{
    error::ServiceError,
    grpc::UserApi,
    models::UserRequest,
    proto::users::v1::{self as pb, user_service_server::UserService},
    repositories::UserRequestRepository,
    service::{PgUserRequestService, UserRequestService},
};

const SCHEMA: &str = include_str!("fixtures/schema.sql");

async fn setup() -> PgPool {
    let db_config = DatabaseConfig::from_env().unwrap();
    let pool = init_pool(&db_config).await.unwrap();
    assert!(health_check(&pool).await.unwrap(), "Database health check failed");

    sqlx::query(SCHEMA).execute(&pool).await.unwrap();
    sqlx::query("TRUNCATE users RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn service(pool: &PgPool) -> PgUserRequestService {
    PgUserRequestService::new(pool.clone(), UserRequestRepository::new(pool.clone()))
}

async fn create(service: &PgUserRequestService, name: &str, email: &str) -> u64 {
    service
        .create_user_request(UserRequest::new(name, email, Utc::now()))
        .await
        .unwrap()
}

async fn row_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn created_user_can_be_fetched_by_id() {
    let pool = setup().await;
    let service = service(&pool);

    let id = create(&service, "A", "a@x.com").await;
    assert_ne!(id, 0);

    let users = service.get_user_by_ids(vec![id]).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, id);
    assert_eq!(users[0].name, "A");
    assert_eq!(users[0].email, "a@x.com");
    assert!(users[0].deleted_at.is_none());

    let again = service.get_user_by_ids(vec![id]).await.unwrap();
    assert_eq!(users, again);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn client_supplied_id_is_kept() {
    let pool = setup().await;
    let service = service(&pool);

    let mut user = UserRequest::new("B", "b@x.com", Utc::now());
    user.id = 4242;
    let id = service.create_user_request(user).await.unwrap();
    assert_eq!(id, 4242);
    assert!(service.check_exists(4242).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn assigned_ids_skip_client_supplied_ones() {
    let pool = setup().await;
    let service = service(&pool);

    let mut first = UserRequest::new("A", "a@x.com", Utc::now());
    first.id = 1;
    assert_eq!(service.create_user_request(first).await.unwrap(), 1);

    let assigned = create(&service, "B", "b@x.com").await;
    assert_ne!(assigned, 0);
    assert_ne!(assigned, 1);

    let mut far = UserRequest::new("C", "c@x.com", Utc::now());
    far.id = 50;
    assert_eq!(service.create_user_request(far).await.unwrap(), 50);

    let after_far = create(&service, "D", "d@x.com").await;
    assert!(after_far > 50);

    let mut low = UserRequest::new("E", "e@x.com", Utc::now());
    low.id = 10;
    assert_eq!(service.create_user_request(low).await.unwrap(), 10);

    let after_low = create(&service, "F", "f@x.com").await;
    assert!(after_low > after_far);
    assert_eq!(row_count(&pool).await, 6);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn repository_writes_run_on_the_pool_without_a_transaction() {
    let pool = setup().await;
    let repository = UserRequestRepository::new(pool.clone());

    let id = repository
        .create(&UserRequest::new("A", "a@x.com", Utc::now()), None)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(id, 0);
    assert!(repository.exists(id).await.unwrap());

    assert!(repository.update(id, "B", "b@x.com", None).await.unwrap());
    let users = repository.get_by_ids(&[id]).await.unwrap();
    assert_eq!(users[0].name, "B");
    assert!(users[0].updated_at.is_some());

    assert!(repository.remove(&[id], None).await.unwrap());
    assert!(!repository.remove(&[id], None).await.unwrap());
    assert!(!repository.exists(id).await.unwrap());
    assert!(!repository.update(id, "C", "c@x.com", None).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn removed_user_disappears_and_cannot_be_removed_again() {
    let pool = setup().await;
    let service = service(&pool);

    let id = create(&service, "A", "a@x.com").await;
    let other = create(&service, "B", "b@x.com").await;

    assert!(service.remove_user_requests(vec![id]).await.unwrap());

    let deleted_at: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM users WHERE id_user = $1")
            .bind(id as i64)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(deleted_at.is_some());

    let listed = service.list_user_requests(10, 0).await.unwrap();
    assert!(listed.iter().all(|u| u.id != id));
    assert!(listed.iter().any(|u| u.id == other));

    assert!(matches!(
        service.get_user_by_ids(vec![id]).await,
        Err(ServiceError::NotFound)
    ));
    assert!(matches!(
        service.check_exists(id).await,
        Err(ServiceError::NotExists)
    ));
    assert!(matches!(
        service.remove_user_requests(vec![id]).await,
        Err(ServiceError::NotRemoved)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn update_changes_live_rows_only() {
    let pool = setup().await;
    let service = service(&pool);

    let id = create(&service, "A", "a@x.com").await;
    assert!(
        service
            .update_user_by_id(id, "B".to_string(), "b@x.com".to_string())
            .await
            .unwrap()
    );

    let first = service.get_user_by_ids(vec![id]).await.unwrap().remove(0);
    assert_eq!(first.name, "B");
    assert_eq!(first.email, "b@x.com");
    let first_updated_at = first.updated_at.unwrap();

    assert!(
        service
            .update_user_by_id(id, "C".to_string(), "c@x.com".to_string())
            .await
            .unwrap()
    );
    let second = service.get_user_by_ids(vec![id]).await.unwrap().remove(0);
    assert!(second.updated_at.unwrap() >= first_updated_at);

    service.remove_user_requests(vec![id]).await.unwrap();
    assert!(matches!(
        service
            .update_user_by_id(id, "D".to_string(), "d@x.com".to_string())
            .await,
        Err(ServiceError::NotUpdated)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn pages_are_disjoint_and_ordered() {
    let pool = setup().await;
    let service = service(&pool);

    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(create(&service, &format!("U{n}"), &format!("u{n}@x.com")).await);
    }

    let first: Vec<u64> = service
        .list_user_requests(2, 0)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    let second: Vec<u64> = service
        .list_user_requests(2, 2)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert!(first[0] < first[1] && first[1] < second[0] && second[0] < second[1]);

    let mut all: Vec<u64> = first.into_iter().chain(second).collect();
    all.sort_unstable();
    ids.sort_unstable();
    assert_eq!(all, ids);

    assert!(matches!(
        service.list_user_requests(2, 4).await,
        Err(ServiceError::NotFound)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn grpc_scenario_create_remove_list() {
    let pool = setup().await;
    let api = UserApi::new(Arc::new(service(&pool)));

    let created = api
        .create_user(Request::new(pb::CreateUserRequest {
            id_user: 1,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(created.id_user, 1);

    let other = api
        .create_user(Request::new(pb::CreateUserRequest {
            id_user: 2,
            name: "B".to_string(),
            email: "b@x.com".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(other.id_user, 2);

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

    let listed = api
        .list_user(Request::new(pb::ListUserRequest {
            limit: 10,
            offset: 0,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(listed.items.iter().all(|u| u.id != 1));
    assert_eq!(listed.items.len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn invalid_create_inserts_nothing() {
    let pool = setup().await;
    let api = UserApi::new(Arc::new(service(&pool)));

    let status = api
        .create_user(Request::new(pb::CreateUserRequest {
            name: String::new(),
            email: "a@x.com".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(row_count(&pool).await, 0);
}

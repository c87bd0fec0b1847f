//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `jardin_test`)
//!   `TEST_DB_PASSWORD` (default: `jardin_test`)
//!   `TEST_DB_NAME` (default: `jardin_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use jardin_common::AppError;
use jardin_db::{
    entities::{event, place, place::PlaceCategory, review},
    repositories::{EventRepository, PlaceRepository, ReviewRepository, Visibility},
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::Set;

fn new_place(slug: &str) -> place::ActiveModel {
    place::ActiveModel {
        name: Set("Cascada Escondida".to_string()),
        slug: Set(slug.to_string()),
        category: Set(PlaceCategory::Cascada),
        description: Set(String::new()),
        address: Set(String::new()),
        lat: Set(None),
        lng: Set(None),
        is_active: Set(true),
        created_by: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_slug_is_conflict() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let repo = PlaceRepository::new(Arc::new(db.conn));

    repo.create(new_place("cascada")).await.unwrap();
    let second = repo.create(new_place("cascada")).await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleting_place_cascades_and_nulls() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);
    let places = PlaceRepository::new(conn.clone());
    let reviews = ReviewRepository::new(conn.clone());
    let events = EventRepository::new(conn.clone());

    let place = places.create(new_place("mirador")).await.unwrap();
    let review = reviews
        .create(review::ActiveModel {
            place_id: Set(place.id),
            rating: Set(4),
            comment: Set(String::new()),
            author_name: Set(String::new()),
            photo: Set(None),
            is_approved: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let event = events
        .create(event::ActiveModel {
            title: Set("Feria".to_string()),
            place_id: Set(Some(place.id)),
            start_date: Set(Utc::now().into()),
            end_date: Set(None),
            description: Set(String::new()),
            is_active: Set(true),
            ..Default::default()
        })
        .await
        .unwrap();

    places.delete(place.id).await.unwrap();

    assert!(reviews.find_by_id(review.id).await.unwrap().is_none());
    let event = events.get_by_id(event.id, Visibility::All).await.unwrap();
    assert_eq!(event.place_id, None);
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("testdb"));
}

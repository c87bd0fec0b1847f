//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20251001_000001_create_user_tables;
mod m20251001_000002_create_place_tables;
mod m20251001_000003_create_event_post_tables;
mod m20251001_000004_create_directory_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_user_tables::Migration),
            Box::new(m20251001_000002_create_place_tables::Migration),
            Box::new(m20251001_000003_create_event_post_tables::Migration),
            Box::new(m20251001_000004_create_directory_tables::Migration),
        ]
    }
}

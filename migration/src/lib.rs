//! Database migrations for the iPaaS dashboard API.

pub use sea_orm_migration::prelude::*;

mod m2026_01_01_000001_create_profiles;
mod m2026_01_01_000002_create_integration_connections;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_01_000001_create_profiles::Migration),
            Box::new(m2026_01_01_000002_create_integration_connections::Migration),
        ]
    }
}

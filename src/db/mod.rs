pub mod entities;
pub mod enums;
pub mod models;
pub mod services;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

const INITIAL_SCHEMA: &str = include_str!("../../migrations/0001_initial.sql");

/// Creates any missing tables and indexes. Safe to run on every start.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = schema_statements(INITIAL_SCHEMA);
    for statement in &statements {
        db.execute_unprepared(statement).await?;
    }
    info!(statements = statements.len(), "Database schema is up to date.");
    Ok(())
}

fn schema_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

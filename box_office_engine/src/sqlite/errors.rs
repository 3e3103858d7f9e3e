use thiserror::Error;

use crate::traits::StoreError;

/// Errors raised while opening or migrating the database. Once a [`super::SqliteDatabase`] is up, every call reports
/// a [`StoreError`] instead.
#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not apply database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl From<SqliteDatabaseError> for StoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

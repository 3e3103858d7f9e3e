use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} was changed by someone else. Reload it and try again.")]
    ConcurrentModification(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("Stored data is invalid: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

use thiserror::Error;

use crate::{
    db_types::{EventId, OrderId, ProductId},
    traits::{GatewayError, StoreError},
    usage::UsageError,
    validation::Rejection,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    Rejected(#[from] Rejection),
    /// The card was not accepted. The message is meant for the buyer.
    #[error("{0}")]
    PaymentDeclined(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    GatewayError(#[from] GatewayError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
    #[error("Order flow is misconfigured: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, Error)]
pub enum TicketUsageError {
    #[error("Forbidden")]
    Forbidden,
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Event {0} does not exist")]
    EventNotFound(EventId),
    #[error("{0}")]
    Usage(#[from] UsageError),
    /// The scanned order cannot be admitted. Door apps show the reason next to the order.
    #[error("{reason}")]
    Refused { id: OrderId, name: Option<String>, reason: UsageError },
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    Invalid(String),
    #[error("Event {0} does not exist")]
    EventNotFound(EventId),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

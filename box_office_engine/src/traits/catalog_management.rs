use chrono::{DateTime, Utc};

use super::StoreError;
use crate::db_types::{Event, EventId, PriceRule, Product, ProductId, ProductSet};

/// Read and write access to the catalog: events, products, their event bindings and price rules.
///
/// Products are always returned fully populated, i.e. with their [`crate::db_types::ProductEvent`] bindings and all
/// of their price rules in insertion order.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    /// Events starting at or after `since`, earliest first.
    async fn fetch_events_after(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] if the id is taken.
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Fetches every product in `ids` that exists. Unknown ids are silently skipped; the validator reports them.
    async fn fetch_products(&self, ids: &[ProductId]) -> Result<ProductSet, StoreError>;

    /// Products with a binding to the given event.
    async fn fetch_products_for_event(&self, event: &EventId) -> Result<Vec<Product>, StoreError>;

    /// Inserts the product, its event bindings and any price rules it carries.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Appends a price rule to a product and returns it with its id filled in.
    async fn insert_price_rule(&self, product: &ProductId, rule: &PriceRule) -> Result<PriceRule, StoreError>;

    /// The number of tickets bound to the event on valid orders.
    async fn tickets_issued_for_event(&self, event: &EventId) -> Result<u32, StoreError>;
}

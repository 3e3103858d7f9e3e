use box_office_engine::{
    db_types::{CardHolder, Event, EventId, Order, OrderId, PriceRule, Product, ProductId, ProductSet, Session},
    helpers::TokenGenerator,
    traits::{CatalogManagement, OrderManagement, SessionProvider, StoreError},
};
use chrono::{DateTime, Utc};
use mockall::mock;

mock! {
    pub BoxOffice {}
    impl CatalogManagement for BoxOffice {
        async fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError>;
        async fn fetch_events_after(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError>;
        async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;
        async fn fetch_products(&self, ids: &[ProductId]) -> Result<ProductSet, StoreError>;
        async fn fetch_products_for_event(&self, event: &EventId) -> Result<Vec<Product>, StoreError>;
        async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
        async fn insert_price_rule(&self, product: &ProductId, rule: &PriceRule) -> Result<PriceRule, StoreError>;
        async fn tickets_issued_for_event(&self, event: &EventId) -> Result<u32, StoreError>;
    }
    impl OrderManagement for BoxOffice {
        async fn insert_order(&self, order: Order, tokens: &TokenGenerator) -> Result<Order, StoreError>;
        async fn update_order(&self, order: &Order) -> Result<Order, StoreError>;
        async fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_by_token(&self, token: &str) -> Result<Option<Order>, StoreError>;
        async fn fetch_orders_for_event(&self, event: &EventId) -> Result<Vec<Order>, StoreError>;
        async fn save_card_holder(&self, holder: &CardHolder) -> Result<(), StoreError>;
        async fn fetch_card_holder(&self, card: &str) -> Result<Option<CardHolder>, StoreError>;
    }
    impl SessionProvider for BoxOffice {
        async fn fetch_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError>;
        async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
        async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
    }
}

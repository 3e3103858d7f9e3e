//! `SqliteDatabase` is the concrete SQLite backend for the box office engine.
//!
//! It implements every storage trait defined in [`crate::traits`]. Calls that touch more than one table run inside a
//! single transaction.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{
    db::{catalog, db_url, new_pool, orders, sessions},
    SqliteDatabaseError,
};
use crate::{
    db_types::{CardHolder, Event, EventId, Order, OrderId, PriceRule, Product, ProductId, ProductSet, Session},
    helpers::TokenGenerator,
    traits::{CatalogManagement, OrderManagement, SessionProvider, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({:?})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using the URL in `BO_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }

    async fn fetch_product_list(&self, ids: Vec<ProductId>) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = catalog::fetch_product(&id, &mut conn).await? {
                result.push(product);
            }
        }
        Ok(result)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_event(id, &mut conn).await
    }

    async fn fetch_events_after(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_events_after(since, &mut conn).await
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_event(event, &mut conn).await
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_product(id, &mut conn).await
    }

    async fn fetch_products(&self, ids: &[ProductId]) -> Result<ProductSet, StoreError> {
        let products = self.fetch_product_list(ids.to_vec()).await?;
        Ok(ProductSet::from(products))
    }

    async fn fetch_products_for_event(&self, event: &EventId) -> Result<Vec<Product>, StoreError> {
        let ids = {
            let mut conn = self.pool.acquire().await?;
            catalog::product_ids_for_event(event, &mut conn).await?
        };
        self.fetch_product_list(ids).await
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        catalog::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_price_rule(&self, product: &ProductId, rule: &PriceRule) -> Result<PriceRule, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_price_rule(product, rule, &mut conn).await
    }

    async fn tickets_issued_for_event(&self, event: &EventId) -> Result<u32, StoreError> {
        let mut conn = self.pool.acquire().await?;
        catalog::tickets_issued_for_event(event, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, mut order: Order, tokens: &TokenGenerator) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        order.token = Some(orders::unused_token(tokens, &mut tx).await?);
        let id = orders::insert_order(&order, &mut tx).await?;
        let stored = orders::fetch_order(id, &mut tx).await?.ok_or(StoreError::OrderNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Order {id} saved with {} ticket(s)", stored.ticket_count());
        Ok(stored)
    }

    async fn update_order(&self, order: &Order) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        orders::update_order(order, &mut tx).await?;
        let id = order.id.ok_or_else(|| StoreError::InvalidData("cannot update an order without an id".into()))?;
        let stored = orders::fetch_order(id, &mut tx).await?.ok_or(StoreError::OrderNotFound(id))?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_by_token(&self, token: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_token(token, &mut conn).await
    }

    async fn fetch_orders_for_event(&self, event: &EventId) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let ids = orders::order_ids_for_event(event, &mut conn).await?;
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = orders::fetch_order(id, &mut conn).await? {
                result.push(order);
            }
        }
        Ok(result)
    }

    async fn save_card_holder(&self, holder: &CardHolder) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::save_card_holder(holder, &mut conn).await
    }

    async fn fetch_card_holder(&self, card: &str) -> Result<Option<CardHolder>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_card_holder(card, &mut conn).await
    }
}

impl SessionProvider for SqliteDatabase {
    async fn fetch_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::purge_expired_sessions(now, &mut conn).await?;
        sessions::fetch_session(token, now, &mut conn).await
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::insert_session(session, &mut conn).await
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::purge_expired_sessions(now, &mut conn).await
    }
}

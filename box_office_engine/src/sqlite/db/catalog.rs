use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Cents, Event, EventId, OrderSource, PriceRule, Product, ProductEvent, ProductId, ProductType},
    traits::StoreError,
};

#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    name: String,
    start: DateTime<Utc>,
    capacity: i64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: EventId(row.id),
            name: row.name,
            start: row.start,
            capacity: u32::try_from(row.capacity).unwrap_or_default(),
        }
    }
}

#[derive(Debug, FromRow)]
struct BindingRow {
    #[sqlx(flatten)]
    event: EventRow,
    priority: i32,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    short_name: String,
    #[sqlx(rename = "type")]
    product_type: String,
    receipt: Option<String>,
    ticket_count: i64,
    ticket_class: String,
}

#[derive(Debug, FromRow)]
struct RuleRow {
    id: i64,
    source: String,
    coupon: Option<String>,
    members_only: bool,
    sales_start: Option<DateTime<Utc>>,
    sales_end: Option<DateTime<Utc>>,
    price: i64,
}

impl TryFrom<RuleRow> for PriceRule {
    type Error = StoreError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let source = OrderSource::from_str(&row.source).map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(PriceRule {
            id: Some(row.id),
            source,
            coupon: row.coupon,
            members_only: row.members_only,
            sales_start: row.sales_start,
            sales_end: row.sales_end,
            price: Cents::from(row.price),
        })
    }
}

pub async fn fetch_event(id: &EventId, conn: &mut SqliteConnection) -> Result<Option<Event>, StoreError> {
    let row: Option<EventRow> =
        sqlx::query_as("SELECT * FROM events WHERE id = $1").bind(&id.0).fetch_optional(conn).await?;
    Ok(row.map(Event::from))
}

pub async fn fetch_events_after(since: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Event>, StoreError> {
    let rows: Vec<EventRow> = sqlx::query_as("SELECT * FROM events WHERE start >= $1 ORDER BY start ASC, id ASC")
        .bind(since)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(Event::from).collect())
}

pub async fn insert_event(event: &Event, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    if fetch_event(&event.id, conn).await?.is_some() {
        return Err(StoreError::AlreadyExists(format!("Event {}", event.id)));
    }
    sqlx::query("INSERT INTO events (id, name, start, capacity) VALUES ($1, $2, $3, $4)")
        .bind(&event.id.0)
        .bind(&event.name)
        .bind(event.start)
        .bind(i64::from(event.capacity))
        .execute(conn)
        .await?;
    debug!("🗃️ Event {} saved", event.id);
    Ok(())
}

/// Loads a product together with its event bindings and price rules.
pub async fn fetch_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, StoreError> {
    let row: Option<ProductRow> =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(&id.0).fetch_optional(&mut *conn).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let product_type = ProductType::from_str(&row.product_type).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    let bindings: Vec<BindingRow> = sqlx::query_as(
        r#"
            SELECT events.*, product_events.priority
            FROM product_events JOIN events ON events.id = product_events.event
            WHERE product_events.product = $1
            ORDER BY product_events.priority ASC, events.start ASC
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;
    let rules: Vec<RuleRow> = sqlx::query_as("SELECT * FROM price_rules WHERE product = $1 ORDER BY id ASC")
        .bind(&row.id)
        .fetch_all(&mut *conn)
        .await?;
    let events =
        bindings.into_iter().map(|b| ProductEvent { event: Event::from(b.event), priority: b.priority }).collect();
    let rules = rules.into_iter().map(PriceRule::try_from).collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Product {
        id: ProductId(row.id),
        name: row.name,
        short_name: row.short_name,
        product_type,
        receipt: row.receipt,
        ticket_count: u32::try_from(row.ticket_count).unwrap_or_default(),
        ticket_class: row.ticket_class,
        events,
        rules,
    }))
}

pub async fn product_ids_for_event(event: &EventId, conn: &mut SqliteConnection) -> Result<Vec<ProductId>, StoreError> {
    let ids: Vec<(String,)> =
        sqlx::query_as("SELECT product FROM product_events WHERE event = $1 ORDER BY product ASC")
            .bind(&event.0)
            .fetch_all(conn)
            .await?;
    Ok(ids.into_iter().map(|(id,)| ProductId(id)).collect())
}

/// Inserts the product row, its bindings and its rules. This is not atomic; wrap it in a transaction.
pub async fn insert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let exists: Option<(String,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1").bind(&product.id.0).fetch_optional(&mut *conn).await?;
    if exists.is_some() {
        return Err(StoreError::AlreadyExists(format!("Product {}", product.id)));
    }
    sqlx::query(
        r#"
            INSERT INTO products (id, name, short_name, type, receipt, ticket_count, ticket_class)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&product.id.0)
    .bind(&product.name)
    .bind(&product.short_name)
    .bind(product.product_type.to_string())
    .bind(&product.receipt)
    .bind(i64::from(product.ticket_count))
    .bind(&product.ticket_class)
    .execute(&mut *conn)
    .await?;
    for binding in &product.events {
        sqlx::query("INSERT INTO product_events (product, event, priority) VALUES ($1, $2, $3)")
            .bind(&product.id.0)
            .bind(&binding.event.id.0)
            .bind(binding.priority)
            .execute(&mut *conn)
            .await?;
    }
    for rule in &product.rules {
        insert_price_rule(&product.id, rule, &mut *conn).await?;
    }
    let (events, rules) = (product.events.len(), product.rules.len());
    debug!("🗃️ Product {} saved with {events} event(s) and {rules} rule(s)", product.id);
    Ok(())
}

pub async fn insert_price_rule(
    product: &ProductId,
    rule: &PriceRule,
    conn: &mut SqliteConnection,
) -> Result<PriceRule, StoreError> {
    let row: RuleRow = sqlx::query_as(
        r#"
            INSERT INTO price_rules (product, source, coupon, members_only, sales_start, sales_end, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        "#,
    )
    .bind(&product.0)
    .bind(rule.source.to_string())
    .bind(&rule.coupon)
    .bind(rule.members_only)
    .bind(rule.sales_start)
    .bind(rule.sales_end)
    .bind(rule.price.value())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Price rule #{} added to {product}", row.id);
    PriceRule::try_from(row)
}

pub async fn tickets_issued_for_event(event: &EventId, conn: &mut SqliteConnection) -> Result<u32, StoreError> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
            SELECT COUNT(*) FROM tickets
            JOIN order_lines ON order_lines.id = tickets.line
            JOIN orders ON orders.id = order_lines.order_id
            WHERE orders.valid AND tickets.event = $1
        "#,
    )
    .bind(&event.0)
    .fetch_one(conn)
    .await?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

use std::{collections::HashMap, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        CardHolder,
        Cents,
        EventBinding,
        EventId,
        MemberId,
        Order,
        OrderId,
        OrderLine,
        OrderSource,
        Payment,
        PaymentType,
        ProductId,
        Ticket,
    },
    helpers::TokenGenerator,
    traits::StoreError,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    token: String,
    source: String,
    name: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    phone: Option<String>,
    customer: Option<String>,
    member: Option<i64>,
    customer_note: Option<String>,
    office_note: Option<String>,
    coupon: Option<String>,
    valid: bool,
    created: DateTime<Utc>,
    revision: i64,
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: i64,
    product: String,
    quantity: i32,
    price: i64,
}

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    line: i64,
    event: Option<String>,
    used: Option<DateTime<Utc>>,
    scan: Option<String>,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: i64,
    #[sqlx(rename = "type")]
    payment_type: String,
    subtype: Option<String>,
    method: Option<String>,
    reference: Option<String>,
    amount: i64,
    created: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct CardHolderRow {
    card: String,
    name: Option<String>,
    email: Option<String>,
}

fn invalid<E: ToString>(e: E) -> StoreError {
    StoreError::InvalidData(e.to_string())
}

//--------------------------------------        Writes        ---------------------------------------------------------

pub async fn token_exists(token: &str, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM orders WHERE token = $1").bind(token).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Draws tokens until one is found that no stored order uses.
pub async fn unused_token(tokens: &TokenGenerator, conn: &mut SqliteConnection) -> Result<String, StoreError> {
    loop {
        let candidate = tokens.next_token();
        if !token_exists(&candidate, &mut *conn).await? {
            return Ok(candidate);
        }
        debug!("🗃️ Order token {candidate} is taken. Drawing another one.");
    }
}

/// Inserts the order row and its children. The order must already carry a token. Returns the new order id.
///
/// This is not atomic. Callers should run it inside a transaction.
pub async fn insert_order(order: &Order, conn: &mut SqliteConnection) -> Result<OrderId, StoreError> {
    let token = order.token.as_deref().ok_or_else(|| StoreError::InvalidData("order has no token".into()))?;
    let created = order.created.ok_or_else(|| StoreError::InvalidData("order has no creation time".into()))?;
    let (id,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO orders (
                token, source, name, email, address, city, state, zip, phone, customer, member,
                customer_note, office_note, coupon, valid, created, revision
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 1)
            RETURNING id
        "#,
    )
    .bind(token)
    .bind(order.source.to_string())
    .bind(&order.name)
    .bind(&order.email)
    .bind(&order.address)
    .bind(&order.city)
    .bind(&order.state)
    .bind(&order.zip)
    .bind(&order.phone)
    .bind(&order.customer)
    .bind(order.member.map(|m| m.0))
    .bind(&order.customer_note)
    .bind(&order.office_note)
    .bind(&order.coupon)
    .bind(order.valid)
    .bind(created)
    .fetch_one(&mut *conn)
    .await?;
    let id = OrderId(id);
    insert_children(id, order, conn).await?;
    Ok(id)
}

/// Writes the order row if the stored revision still matches, bumping it by one. Returns the new revision.
///
/// Child rows are replaced wholesale. Rows that carry an id keep it, so ticket ids are stable across updates.
pub async fn update_order(order: &Order, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let id = order.id.ok_or_else(|| StoreError::InvalidData("cannot update an order without an id".into()))?;
    let updated: Option<(i64,)> = sqlx::query_as(
        r#"
            UPDATE orders SET
                source = $1, name = $2, email = $3, address = $4, city = $5, state = $6, zip = $7, phone = $8,
                customer = $9, member = $10, customer_note = $11, office_note = $12, coupon = $13, valid = $14,
                revision = revision + 1
            WHERE id = $15 AND revision = $16
            RETURNING revision
        "#,
    )
    .bind(order.source.to_string())
    .bind(&order.name)
    .bind(&order.email)
    .bind(&order.address)
    .bind(&order.city)
    .bind(&order.state)
    .bind(&order.zip)
    .bind(&order.phone)
    .bind(&order.customer)
    .bind(order.member.map(|m| m.0))
    .bind(&order.customer_note)
    .bind(&order.office_note)
    .bind(&order.coupon)
    .bind(order.valid)
    .bind(id.0)
    .bind(order.revision)
    .fetch_optional(&mut *conn)
    .await?;
    let Some((revision,)) = updated else {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT revision FROM orders WHERE id = $1").bind(id.0).fetch_optional(&mut *conn).await?;
        return match exists {
            Some((stored,)) => {
                warn!("🗃️ Order {id} is at revision {stored}, but the update was based on {}", order.revision);
                Err(StoreError::ConcurrentModification(id))
            },
            None => Err(StoreError::OrderNotFound(id)),
        };
    };
    delete_children(id, &mut *conn).await?;
    insert_children(id, order, conn).await?;
    trace!("🗃️ Order {id} is now at revision {revision}");
    Ok(revision)
}

pub async fn delete_order(id: OrderId, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    delete_children(id, &mut *conn).await?;
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id.0).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::OrderNotFound(id));
    }
    debug!("🗃️ Order {id} deleted");
    Ok(())
}

async fn delete_children(id: OrderId, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM tickets WHERE line IN (SELECT id FROM order_lines WHERE order_id = $1)")
        .bind(id.0)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM order_lines WHERE order_id = $1").bind(id.0).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM payments WHERE order_id = $1").bind(id.0).execute(&mut *conn).await?;
    Ok(())
}

async fn insert_children(id: OrderId, order: &Order, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    for (position, line) in order.lines.iter().enumerate() {
        let (line_id,): (i64,) = sqlx::query_as(
            r#"
                INSERT INTO order_lines (id, order_id, position, product, quantity, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
            "#,
        )
        .bind(line.id)
        .bind(id.0)
        .bind(position as i64)
        .bind(&line.product.0)
        .bind(line.quantity)
        .bind(line.price.value())
        .fetch_one(&mut *conn)
        .await?;
        for (position, ticket) in line.tickets.iter().enumerate() {
            sqlx::query(
                r#"
                    INSERT INTO tickets (id, line, position, event, used, scan)
                    VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(ticket.id)
            .bind(line_id)
            .bind(position as i64)
            .bind(ticket.event.event().map(|e| e.0.as_str()))
            .bind(ticket.used)
            .bind(&ticket.scan)
            .execute(&mut *conn)
            .await?;
        }
    }
    for (position, payment) in order.payments.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO payments (id, order_id, position, type, subtype, method, reference, amount, created)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id)
        .bind(id.0)
        .bind(position as i64)
        .bind(payment.payment_type.to_string())
        .bind(&payment.subtype)
        .bind(&payment.method)
        .bind(&payment.reference)
        .bind(payment.amount.value())
        .bind(payment.created)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

//--------------------------------------        Reads         ---------------------------------------------------------

/// Loads the full order graph for the given id.
pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.0).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(Some(assemble_order(row, conn).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_order_by_token(token: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE token = $1").bind(token).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(Some(assemble_order(row, conn).await?)),
        None => Ok(None),
    }
}

/// Ids of valid orders with tickets for the event. That includes flexible passes that could still be used there.
pub async fn order_ids_for_event(event: &EventId, conn: &mut SqliteConnection) -> Result<Vec<OrderId>, StoreError> {
    let ids: Vec<(i64,)> = sqlx::query_as(
        r#"
            SELECT DISTINCT orders.id FROM orders
            JOIN order_lines ON order_lines.order_id = orders.id
            JOIN tickets ON tickets.line = order_lines.id
            LEFT JOIN product_events ON product_events.product = order_lines.product AND product_events.event = $1
            WHERE orders.valid AND (tickets.event = $1 OR (tickets.event IS NULL AND product_events.event IS NOT NULL))
            ORDER BY orders.id ASC
        "#,
    )
    .bind(&event.0)
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(|(id,)| OrderId(id)).collect())
}

async fn assemble_order(row: OrderRow, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let lines: Vec<LineRow> =
        sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY position ASC")
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await?;
    let tickets: Vec<TicketRow> = sqlx::query_as(
        r#"
            SELECT tickets.* FROM tickets JOIN order_lines ON order_lines.id = tickets.line
            WHERE order_lines.order_id = $1
            ORDER BY tickets.line ASC, tickets.position ASC
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;
    let payments: Vec<PaymentRow> =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY position ASC")
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await?;

    let mut tickets_by_line = HashMap::<i64, Vec<Ticket>>::new();
    for t in tickets {
        let ticket = Ticket {
            id: Some(t.id),
            event: EventBinding::from(t.event.map(EventId)),
            used: t.used,
            scan: t.scan,
        };
        tickets_by_line.entry(t.line).or_default().push(ticket);
    }
    let lines = lines
        .into_iter()
        .map(|l| OrderLine {
            id: Some(l.id),
            product: ProductId(l.product),
            quantity: l.quantity,
            price: Cents::from(l.price),
            used: 0,
            used_at: None,
            tickets: tickets_by_line.remove(&l.id).unwrap_or_default(),
        })
        .collect();
    let payments = payments
        .into_iter()
        .map(|p| {
            Ok(Payment {
                id: Some(p.id),
                payment_type: PaymentType::from_str(&p.payment_type).map_err(invalid)?,
                subtype: p.subtype,
                method: p.method,
                reference: p.reference,
                amount: Cents::from(p.amount),
                created: p.created,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(Order {
        id: Some(OrderId(row.id)),
        token: Some(row.token),
        source: OrderSource::from_str(&row.source).map_err(invalid)?,
        name: row.name,
        email: row.email,
        address: row.address,
        city: row.city,
        state: row.state,
        zip: row.zip,
        phone: row.phone,
        customer: row.customer,
        member: row.member.map(MemberId),
        customer_note: row.customer_note,
        office_note: row.office_note,
        coupon: row.coupon,
        valid: row.valid,
        created: Some(row.created),
        revision: row.revision,
        lines,
        payments,
    })
}

//--------------------------------------     Card holders     ---------------------------------------------------------

pub async fn save_card_holder(holder: &CardHolder, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query(
        r#"
            INSERT INTO card_holders (card, name, email) VALUES ($1, $2, $3)
            ON CONFLICT (card) DO UPDATE SET name = excluded.name, email = excluded.email
        "#,
    )
    .bind(&holder.card)
    .bind(&holder.name)
    .bind(&holder.email)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_card_holder(card: &str, conn: &mut SqliteConnection) -> Result<Option<CardHolder>, StoreError> {
    let row: Option<CardHolderRow> =
        sqlx::query_as("SELECT * FROM card_holders WHERE card = $1").bind(card).fetch_optional(conn).await?;
    Ok(row.map(|r| CardHolder { card: r.card, name: r.name, email: r.email }))
}

use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use super::errors::TicketUsageError;
use crate::{
    db_types::{EventId, Order, OrderId, OrderSource, Privilege, ProductId, ProductSet, Session},
    helpers::{SharedClock, TokenGenerator},
    traits::TicketingDatabase,
    usage::{apply_usage, preview_usage, ClassUsage, DoorContext, FreeClasses, UsageRequest},
};

/// How the door app names the order it scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    Id(OrderId),
    Token(String),
    /// Walk-up admission to an event that offers free entry. A new order is created on apply.
    Free,
}

impl OrderLookup {
    pub fn parse(s: &str) -> Self {
        match s {
            "free" => OrderLookup::Free,
            s => match s.parse::<i64>() {
                Ok(id) => OrderLookup::Id(OrderId(id)),
                Err(_) => OrderLookup::Token(s.to_string()),
            },
        }
    }
}

/// What the door app shows after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePreview {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The scan session token. It must be sent back with the usage changes.
    pub scan: String,
    pub classes: Vec<ClassUsage>,
}

/// `TicketUsageApi` drives door scanning: a read-only preview when an order is scanned, followed by one atomic write
/// of the counts the door staff settle on.
pub struct TicketUsageApi<B> {
    db: B,
    clock: SharedClock,
    tokens: TokenGenerator,
}

impl<B> Debug for TicketUsageApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketUsageApi")
    }
}

impl<B> TicketUsageApi<B> {
    pub fn new(db: B, clock: SharedClock) -> Self {
        Self { db, clock, tokens: TokenGenerator::new() }
    }

    pub fn with_token_generator(mut self, tokens: TokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }
}

impl<B> TicketUsageApi<B>
where B: TicketingDatabase
{
    pub async fn preview(
        &self,
        event: &EventId,
        lookup: &OrderLookup,
        caller: Option<&Session>,
    ) -> Result<UsagePreview, TicketUsageError> {
        require_door_staff(caller)?;
        self.check_event(event).await?;
        let order = self.find_order(lookup).await?;
        let id = order.id.ok_or_else(|| TicketUsageError::OrderNotFound(format!("{lookup:?}")))?;
        let ctx = self.door_context(event, &order).await?;
        let classes = preview_usage(&order, &ctx).map_err(|reason| {
            debug!("🎟️ Order {id} scanned at {event}: {reason}");
            TicketUsageError::Refused { id, name: order.name.clone(), reason }
        })?;
        let scan = self.tokens.next_token();
        trace!("🎟️ Order {id} scanned at {event} in session {scan}");
        Ok(UsagePreview { id, name: order.name, scan, classes })
    }

    /// Records the usage counts for a scan session and returns the updated order. Either every request is applied or
    /// none is.
    pub async fn apply(
        &self,
        event: &EventId,
        lookup: &OrderLookup,
        scan: &str,
        requests: &[UsageRequest],
        caller: Option<&Session>,
    ) -> Result<Order, TicketUsageError> {
        require_door_staff(caller)?;
        self.check_event(event).await?;
        let now = self.clock.now();
        let order = match lookup {
            OrderLookup::Free => free_entry_order(now),
            lookup => self.find_order(lookup).await?,
        };
        let ctx = self.door_context(event, &order).await?;
        let updated = apply_usage(&order, &ctx, scan, requests, now)?;
        let stored = match lookup {
            OrderLookup::Free => self.db.insert_order(updated, &self.tokens).await?,
            _ => self.db.update_order(&updated).await?,
        };
        debug!(
            "🎟️ Usage for order {:?} at {event} recorded: {}",
            stored.id,
            requests.iter().map(|r| format!("{}={}", r.class, r.used)).collect::<Vec<_>>().join(", ")
        );
        Ok(stored)
    }

    async fn check_event(&self, event: &EventId) -> Result<(), TicketUsageError> {
        match self.db.fetch_event(event).await? {
            Some(_) => Ok(()),
            None => Err(TicketUsageError::EventNotFound(event.clone())),
        }
    }

    /// Only valid orders can be used at the door.
    async fn find_order(&self, lookup: &OrderLookup) -> Result<Order, TicketUsageError> {
        let order = match lookup {
            OrderLookup::Id(id) => self.db.fetch_order(*id).await?,
            OrderLookup::Token(token) => self.db.fetch_order_by_token(token).await?,
            OrderLookup::Free => None,
        };
        order.filter(|o| o.valid).ok_or_else(|| TicketUsageError::OrderNotFound(format!("{lookup:?}")))
    }

    async fn door_context(&self, event: &EventId, order: &Order) -> Result<DoorContext, TicketUsageError> {
        let ids = order.lines.iter().map(|l| l.product.clone()).collect::<Vec<ProductId>>();
        let mut products: ProductSet = self.db.fetch_products(&ids).await?;
        let at_event = self.db.fetch_products_for_event(event).await?;
        for p in &at_event {
            products.insert(p.clone());
        }
        let free = FreeClasses::for_event(event, at_event);
        Ok(DoorContext::new(event.clone(), products, free))
    }
}

fn require_door_staff(caller: Option<&Session>) -> Result<(), TicketUsageError> {
    match caller {
        Some(session) if session.privileges.any(&[Privilege::Sell, Privilege::Admit]) => Ok(()),
        _ => Err(TicketUsageError::Forbidden),
    }
}

fn free_entry_order(now: chrono::DateTime<chrono::Utc>) -> Order {
    Order {
        source: OrderSource::InPerson,
        name: Some("Free Entry".to_string()),
        valid: true,
        created: Some(now),
        ..Default::default()
    }
}

//! Ticket allocation.
//!
//! Expands every ticket-bearing line of a [`ValidatedOrder`] into individual [`Ticket`] records and gives each one a
//! tentative event binding. Flexible passes that could still be used at more than one upcoming event stay
//! [`EventBinding::Unbound`] until they are scanned at a door.
use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{EventBinding, Product, Ticket},
    helpers::SharedClock,
    validation::ValidatedOrder,
};

/// Events that started less than this many minutes ago still count as upcoming, so that tickets sold at the door after
/// curtain are bound to the show in progress.
pub const DOOR_SALES_GRACE_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct TicketAllocator {
    clock: SharedClock,
}

impl TicketAllocator {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    pub fn allocate(&self, validated: &mut ValidatedOrder) {
        let now = self.clock.now();
        let (order, products) = validated.parts_mut();
        let created = order.created.unwrap_or(now);
        for line in &mut order.lines {
            let Some(product) = products.get(&line.product).filter(|p| p.issues_tickets()) else {
                continue;
            };
            let binding = binding_for(product, now);
            let count = usize::try_from(line.quantity).unwrap_or_default() * product.ticket_count as usize;
            let used = usize::try_from(line.used).unwrap_or_default().min(count);
            let used_at = line.used_at.take().map(EventBinding::BoundTo).unwrap_or(EventBinding::Unbound);
            line.tickets = (0..count)
                .map(|i| {
                    if i < used {
                        Ticket { used: Some(created), ..Ticket::new(used_at.clone()) }
                    } else {
                        Ticket::new(binding.clone())
                    }
                })
                .collect();
            line.used = 0;
            trace!("🎟️ {count} tickets for {} allocated to {binding:?} ({used} already used)", product.id);
        }
    }
}

/// A dedicated or sole binding wins. Otherwise the product is bound only if exactly one of its events is still
/// upcoming.
pub fn binding_for(product: &Product, now: DateTime<Utc>) -> EventBinding {
    if let [only] = product.events.as_slice() {
        return EventBinding::BoundTo(only.event.id.clone());
    }
    if let Some(event) = product.dedicated_event() {
        return EventBinding::BoundTo(event.id.clone());
    }
    let cutoff = now - Duration::minutes(DOOR_SALES_GRACE_MINUTES);
    let mut upcoming = product.events.iter().filter(|pe| pe.event.start > cutoff);
    match (upcoming.next(), upcoming.next()) {
        (Some(pe), None) => EventBinding::BoundTo(pe.event.id.clone()),
        _ => EventBinding::Unbound,
    }
}

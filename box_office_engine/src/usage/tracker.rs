use chrono::{DateTime, Utc};
use log::*;

use super::{class_map, ClassMap, ClassUsage, FreeClasses, UsageError, UsageRequest, FREE_CLASS_MAX};
use crate::db_types::{Cents, EventBinding, EventId, Order, OrderLine, Product, ProductSet, Ticket};

/// Everything the tracker needs to know about the door it is working at.
#[derive(Debug, Clone)]
pub struct DoorContext {
    event: EventId,
    products: ProductSet,
    free: FreeClasses,
}

impl DoorContext {
    /// `products` must hold the catalog entries of every product on the order. Free-class products are added
    /// automatically.
    pub fn new(event: EventId, mut products: ProductSet, free: FreeClasses) -> Self {
        for p in free.products() {
            products.insert(p.clone());
        }
        Self { event, products, free }
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    fn issued(&self, order: &Order, lines: &[usize]) -> u32 {
        lines
            .iter()
            .filter_map(|&idx| {
                let line = &order.lines[idx];
                let product = self.products.get(&line.product)?;
                Some(u32::try_from(line.quantity).unwrap_or_default() * product.ticket_count)
            })
            .sum()
    }
}

fn count_used<F: Fn(&Ticket) -> bool>(order: &Order, lines: &[usize], filter: F) -> u32 {
    let count = lines
        .iter()
        .flat_map(|&idx| order.lines[idx].tickets.iter())
        .filter(|t| t.is_used() && filter(*t))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Computes the usage bounds shown when an order is first scanned. Nothing is modified.
///
/// The natural admission is one ticket from the class holding the order's first line. Classes the event admits for
/// free are always listed, even if the order holds none of their tickets.
pub fn preview_usage(order: &Order, ctx: &DoorContext) -> Result<Vec<ClassUsage>, UsageError> {
    let mut map = class_map(order, &ctx.products, &ctx.event).ok_or(UsageError::NotATicketOrder)?;
    if map.is_empty() {
        return Err(UsageError::WrongEvent);
    }
    for class in ctx.free.classes() {
        map.entry(class.clone()).or_default();
    }
    let classes = map
        .iter()
        .map(|(name, lines)| {
            let free = ctx.free.contains(name);
            let min = count_used(order, lines, |_| true);
            let mut max = ctx.issued(order, lines);
            let mut used = min + u32::from(lines.contains(&0));
            let mut overflow = false;
            if free {
                max = FREE_CLASS_MAX;
            } else if used > max {
                used = max;
                overflow = true;
            }
            ClassUsage { name: name.clone(), min, max, used, overflow }
        })
        .collect::<Vec<_>>();
    if classes.iter().all(|c| c.min >= c.max) {
        return Err(UsageError::AlreadyUsed);
    }
    Ok(classes)
}

/// Applies a batch of usage changes for the scan session `scan`, returning the updated order.
///
/// Every request is checked against the order as modified by the requests before it. The batch is all or nothing:
/// if any request fails, the error is returned and `order` is untouched.
pub fn apply_usage(
    order: &Order,
    ctx: &DoorContext,
    scan: &str,
    requests: &[UsageRequest],
    now: DateTime<Utc>,
) -> Result<Order, UsageError> {
    let mut working = order.clone();
    let mut map = match class_map(&working, &ctx.products, &ctx.event) {
        Some(map) if map.is_empty() => return Err(UsageError::WrongEvent),
        Some(map) => map,
        None if working.lines.is_empty() => ClassMap::new(),
        None => return Err(UsageError::NotATicketOrder),
    };
    for request in requests {
        let mut lines = map.get(&request.class).cloned().unwrap_or_default();
        let wanted = request.used;
        let max = ctx.issued(&working, &lines);
        let used = count_used(&working, &lines, |_| true);
        let min = count_used(&working, &lines, |t| t.scan.as_deref() != Some(scan));
        trace!("🎟️ {}: min {min}, max {max}, used {used}, wanted {wanted}", request.class);
        if wanted < min {
            return Err(UsageError::BelowMinimum);
        }
        if wanted > max {
            let product = ctx.free.get(&request.class).ok_or(UsageError::AlreadyUsed)?;
            if wanted > FREE_CLASS_MAX {
                return Err(UsageError::AboveMaximum);
            }
            if let Some(idx) = add_free_tickets(&mut working, product, &ctx.event, wanted - max) {
                lines.push(idx);
            }
        }
        if wanted > used {
            consume(&mut working, &lines, &ctx.event, scan, now, wanted - used)?;
        } else if wanted < used {
            release(&mut working, &lines, scan, used - wanted)?;
        }
        map.insert(request.class.clone(), lines);
    }
    Ok(working)
}

/// Adds enough free tickets of `product` to cover `needed`. An existing free line for the product is grown in place;
/// otherwise a new line is appended and its index returned.
fn add_free_tickets(order: &mut Order, product: &Product, event: &EventId, needed: u32) -> Option<usize> {
    let per_unit = product.ticket_count.max(1);
    let units = needed.div_ceil(per_unit);
    let tickets = (0..units * per_unit).map(|_| Ticket::new(EventBinding::BoundTo(event.clone())));
    let quantity = i32::try_from(units).unwrap_or(i32::MAX);
    let existing = order.lines.iter().position(|l| l.product == product.id && l.price.is_zero());
    debug!("🎟️ Adding {needed} free {} tickets to order", product.ticket_class);
    match existing {
        Some(idx) => {
            let line = &mut order.lines[idx];
            line.quantity += quantity;
            line.tickets.extend(tickets);
            None
        },
        None => {
            let mut line = OrderLine::new(product.id.clone(), quantity, Cents::from(0));
            line.tickets = tickets.collect();
            order.lines.push(line);
            Some(order.lines.len() - 1)
        },
    }
}

/// Marks `count` unused tickets as used, walking the lines in priority order.
fn consume(
    order: &mut Order,
    lines: &[usize],
    event: &EventId,
    scan: &str,
    now: DateTime<Utc>,
    count: u32,
) -> Result<(), UsageError> {
    let mut remaining = count;
    for &idx in lines {
        for ticket in order.lines[idx].tickets.iter_mut().filter(|t| !t.is_used()) {
            if remaining == 0 {
                return Ok(());
            }
            ticket.used = Some(now);
            ticket.event = EventBinding::BoundTo(event.clone());
            ticket.scan = Some(scan.to_string());
            remaining -= 1;
        }
    }
    match remaining {
        0 => Ok(()),
        _ => Err(UsageError::AlreadyUsed),
    }
}

/// Releases `count` tickets consumed in this scan session, starting from the end of the lowest-priority line.
fn release(order: &mut Order, lines: &[usize], scan: &str, count: u32) -> Result<(), UsageError> {
    let mut remaining = count;
    for &idx in lines.iter().rev() {
        let tickets = order.lines[idx].tickets.iter_mut().rev();
        for ticket in tickets.filter(|t| t.is_used() && t.scan.as_deref() == Some(scan)) {
            if remaining == 0 {
                return Ok(());
            }
            ticket.used = None;
            ticket.scan = None;
            remaining -= 1;
        }
    }
    match remaining {
        0 => Ok(()),
        _ => Err(UsageError::BelowMinimum),
    }
}

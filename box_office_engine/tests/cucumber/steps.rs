use box_office_common::Cents;
use box_office_engine::{
    db_types::{OrderLine, PaymentType},
    test_utils::fixtures::{door_order, door_staff, public_order, SEASON_PASS},
    traits::{CatalogManagement, OrderManagement},
    usage::UsageRequest,
    OrderLookup,
};
use chrono::{DateTime, Utc};
use cucumber::{given, then, when};

use crate::cucumber::{box_office_world::concert, BoxOfficeWorld};

#[given(expr = "the clock reads {string}")]
async fn set_clock(world: &mut BoxOfficeWorld, now: String) {
    let now = DateTime::parse_from_rfc3339(&now).expect("Not an RFC 3339 timestamp").with_timezone(&Utc);
    world.system().clock.set(now);
}

#[when(expr = "a customer buys {int} adult ticket(s) online")]
async fn buy_online(world: &mut BoxOfficeWorld, quantity: i32) {
    let order = world.system().orders.place_order(public_order(quantity), None).await.expect("Error placing order");
    world.lookup = order.token.clone().map(OrderLookup::Token);
    world.order = Some(order);
}

#[when(expr = "the door sells {int} season pass(es) for cash")]
async fn sell_season_pass(world: &mut BoxOfficeWorld, quantity: i32) {
    let mut draft = door_order(quantity, PaymentType::Cash);
    draft.lines[0] = OrderLine::new(SEASON_PASS.into(), quantity, Cents::from(5000));
    draft.payments[0].amount = draft.total();
    let staff = door_staff();
    let order = world.system().orders.place_order(draft, Some(&staff)).await.expect("Error placing order");
    world.lookup = order.id.map(OrderLookup::Id);
    world.order = Some(order);
}

#[when(expr = "the order is scanned at the {word} concert")]
async fn scan_order(world: &mut BoxOfficeWorld, name: String) {
    let staff = door_staff();
    let result = world.system().usage.preview(&concert(&name), world.lookup(), Some(&staff)).await;
    match result {
        Ok(preview) => {
            world.preview = Some(preview);
            world.error = None;
        },
        Err(e) => {
            world.preview = None;
            world.error = Some(e.to_string());
        },
    }
}

#[when(expr = "the door staff at the {word} concert mark {int} {word} ticket(s) used")]
async fn mark_used(world: &mut BoxOfficeWorld, name: String, used: u32, class: String) {
    let staff = door_staff();
    let scan = world.scan();
    let requests = [UsageRequest::new(class, used)];
    let result = world.system().usage.apply(&concert(&name), world.lookup(), &scan, &requests, Some(&staff)).await;
    match result {
        Ok(order) => {
            world.order = Some(order);
            world.error = None;
        },
        Err(e) => world.error = Some(e.to_string()),
    }
}

#[when(expr = "a walk-up guest brings {int} {word} to the {word} concert")]
async fn free_entry(world: &mut BoxOfficeWorld, count: u32, class: String, name: String) {
    let staff = door_staff();
    let requests = [UsageRequest::new(class, count)];
    let usage = &world.system().usage;
    let result = usage.apply(&concert(&name), &OrderLookup::Free, "walk-up", &requests, Some(&staff)).await;
    match result {
        Ok(order) => {
            world.lookup = order.id.map(OrderLookup::Id);
            world.order = Some(order);
            world.error = None;
        },
        Err(e) => world.error = Some(e.to_string()),
    }
}

#[then(expr = "the preview shows {word} with min {int}, max {int} and used {int}")]
async fn check_preview(world: &mut BoxOfficeWorld, class: String, min: u32, max: u32, used: u32) {
    let preview = world.preview.as_ref().expect("No preview was shown");
    let usage = preview.classes.iter().find(|c| c.name == class).expect("Class is not in the preview");
    assert_eq!((usage.min, usage.max, usage.used), (min, max, used), "Unexpected bounds for {class}");
}

#[then(expr = "the scan is rejected with {string}")]
async fn check_rejected(world: &mut BoxOfficeWorld, message: String) {
    assert_eq!(world.error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the order has {int} used ticket(s)")]
async fn check_used(world: &mut BoxOfficeWorld, count: usize) {
    let order = world.order.as_ref().expect("No order");
    let id = order.id.expect("Order was not stored");
    let stored = world.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order is missing");
    let used = stored.lines.iter().map(|l| l.tickets_used()).sum::<usize>();
    assert_eq!(used, count);
}

#[then(expr = "{int} ticket(s) have been issued for the {word} concert")]
async fn check_issued(world: &mut BoxOfficeWorld, count: u32, name: String) {
    let issued = world.system().db.tickets_issued_for_event(&concert(&name)).await.expect("Error counting tickets");
    assert_eq!(issued, count);
}

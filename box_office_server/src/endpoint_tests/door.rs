use actix_web::{http::StatusCode, web, web::ServiceConfig};
use box_office_engine::{
    db_types::{Cents, EventBinding, Order, OrderId, OrderLine, OrderSource, ProductSet, Ticket},
    test_utils::fixtures::{adult_ticket, child_ticket, donation, public_order, spring_concert, DONATION, SPRING},
    TicketUsageApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{clock, get_request, post_request, DOOR_TOKEN, SETUP_TOKEN},
    mocks::MockBoxOffice,
};
use crate::routes::{ApplyUsageRoute, PreviewUsageRoute};

#[actix_web::test]
async fn preview_needs_door_staff() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/21");
    let err = get_request("", &path, configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication required");
    let err = get_request(SETUP_TOKEN, &path, configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
}

#[actix_web::test]
async fn preview_ticket_order() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/21");
    let (status, body) = get_request(DOOR_TOKEN, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let preview: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(preview["id"], 21);
    assert_eq!(preview["name"], "Jane Doe");
    assert!(preview["scan"].as_str().is_some_and(|s| s.len() == 14));
    let adults = preview["classes"].as_array().unwrap().iter().find(|c| c["name"] == "Adult").unwrap();
    assert_eq!(adults["max"], 2);
    assert_eq!(adults["min"], 0);
}

#[actix_web::test]
async fn preview_refusal_names_the_order() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/22");
    let (status, body) = get_request(DOOR_TOKEN, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":22,"name":"John Smith","error":"Not a ticket order"}"#);
}

#[actix_web::test]
async fn preview_unknown_order() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/23");
    let (status, _) = get_request(DOOR_TOKEN, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn apply_usage() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/21");
    let change = json!({ "scan": "1111-2222-3333", "classes": [{ "class": "Adult", "used": 2 }] });
    let (status, body) = post_request(DOOR_TOKEN, &path, change, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":21,"scan":"1111-2222-3333"}"#);
}

#[actix_web::test]
async fn apply_to_non_ticket_order_is_informational() {
    let _ = env_logger::try_init().ok();
    let path = format!("/events/{SPRING}/tickets/22");
    let change = json!({ "scan": "1111-2222-3333", "classes": [{ "class": "Adult", "used": 1 }] });
    let (status, body) = post_request(DOOR_TOKEN, &path, change, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":22,"error":"Not a ticket order"}"#);
}

#[actix_web::test]
async fn unknown_event() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(DOOR_TOKEN, "/events/winter-2024/tickets/21", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Event winter-2024 does not exist"}"#);
}

fn ticket_order() -> Order {
    let mut order = public_order(2);
    order.id = Some(OrderId(21));
    order.valid = true;
    order.lines[0].tickets = vec![Ticket::new(EventBinding::BoundTo(SPRING.into())); 2];
    order
}

fn donation_order() -> Order {
    let mut order = Order::new(OrderSource::Public);
    order.id = Some(OrderId(22));
    order.name = Some("John Smith".into());
    order.valid = true;
    order.lines.push(OrderLine::new(DONATION.into(), 1, Cents::from(5000)));
    order
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockBoxOffice::new();
    db.expect_fetch_event().returning(|id| Ok((id.0 == SPRING).then(spring_concert)));
    db.expect_fetch_order().returning(|id| {
        Ok(match id.0 {
            21 => Some(ticket_order()),
            22 => Some(donation_order()),
            _ => None,
        })
    });
    db.expect_fetch_products().returning(|_| Ok(ProductSet::from(vec![adult_ticket(), donation()])));
    db.expect_fetch_products_for_event().returning(|_| Ok(vec![adult_ticket(), child_ticket()]));
    db.expect_update_order().returning(|order| Ok(order.clone()));
    let api = TicketUsageApi::new(db, clock());
    cfg.service(PreviewUsageRoute::<MockBoxOffice>::new())
        .service(ApplyUsageRoute::<MockBoxOffice>::new())
        .app_data(web::Data::new(api));
}

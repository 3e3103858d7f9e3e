use actix_web::{http::StatusCode, web, web::ServiceConfig};
use box_office_engine::{
    db_types::{Cents, Order, OrderId, OrderLine, OrderSource, Payment, PaymentType, ProductSet},
    events::EventProducers,
    test_utils::{
        fixtures::{adult_ticket, public_order, ADULT},
        FakeGateway,
        GatewayBehaviour,
    },
    traits::StoreError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{clock, delete_request, get_request, post_request, DOOR_TOKEN, OFFICE_TOKEN},
    mocks::MockBoxOffice,
};
use crate::routes::{CancelOrderRoute, CaptureOrderRoute, OrderByIdRoute, PlaceOrderRoute, TicketsRoute};

#[actix_web::test]
async fn fetch_order_no_session() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/orders/5", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication required");
}

#[actix_web::test]
async fn fetch_order_unknown_session() {
    let _ = env_logger::try_init().ok();
    let err = get_request("not-a-session", "/orders/5", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication required");
}

#[actix_web::test]
async fn fetch_order_as_door_staff() {
    let _ = env_logger::try_init().ok();
    let err = get_request(DOOR_TOKEN, "/orders/5", configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
}

#[actix_web::test]
async fn fetch_order_as_office_staff() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(OFFICE_TOKEN, "/orders/5", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, Some(OrderId(5)));
    assert_eq!(order.office_note.as_deref(), Some("Wheelchair seating"));
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(OFFICE_TOKEN, "/orders/6", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Order #6 does not exist"}"#);
}

#[actix_web::test]
async fn tickets_hide_office_notes() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/tickets/1234-5678-9012", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, Some(OrderId(5)));
    assert!(order.office_note.is_none());
    let (status, _) = get_request("", "/tickets/0000-0000-0000", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn declined_card_is_not_an_http_error() {
    let _ = env_logger::try_init().ok();
    let draft = serde_json::to_value(public_order(2)).unwrap();
    let (status, body) = post_request("", "/orders", draft, configure_declines).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":"Your card was declined."}"#);
}

#[actix_web::test]
async fn invalid_drafts_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let mut draft = public_order(2);
    draft.email = Some("not an email".into());
    let draft = serde_json::to_value(draft).unwrap();
    let (status, body) = post_request("", "/orders", draft, configure_declines).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("email"), "{body}");
}

#[actix_web::test]
async fn capture_conflicts() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(DOOR_TOKEN, "/orders/8/capture", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("error"), "{body}");
}

#[actix_web::test]
async fn cancel_pending_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = delete_request(DOOR_TOKEN, "/orders/8", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order #8 cancelled"}"#);
    let err = delete_request(OFFICE_TOKEN, "/orders/8", configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
}

fn stored_order() -> Order {
    let mut order = public_order(2);
    order.id = Some(OrderId(5));
    order.token = Some("1234-5678-9012".into());
    order.office_note = Some("Wheelchair seating".into());
    order.valid = true;
    order
}

/// A door sale waiting for the card reader.
fn pending_order() -> Order {
    let mut order = Order::new(OrderSource::InPerson);
    order.id = Some(OrderId(8));
    order.lines.push(OrderLine::new(ADULT.into(), 1, Cents::from(3000)));
    let mut payment = Payment::new(PaymentType::CardPresent, Cents::from(3000)).with_method("pi_3Abc_secret_Xyz");
    payment.reference = Some("pi_3Abc".into());
    order.payments.push(payment);
    order
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockBoxOffice::new();
    db.expect_fetch_order().returning(|id| {
        Ok(match id.0 {
            5 => Some(stored_order()),
            8 => Some(pending_order()),
            _ => None,
        })
    });
    db.expect_fetch_order_by_token()
        .returning(|token| Ok((token == "1234-5678-9012").then(stored_order)));
    db.expect_fetch_card_holder().returning(|_| Ok(None));
    db.expect_update_order().returning(|order| Err(StoreError::ConcurrentModification(order.id.unwrap())));
    db.expect_delete_order().returning(|_| Ok(()));
    let api = OrderFlowApi::new(db, FakeGateway::new(), EventProducers::default(), clock()).unwrap();
    cfg.service(OrderByIdRoute::<MockBoxOffice, FakeGateway>::new())
        .service(CaptureOrderRoute::<MockBoxOffice, FakeGateway>::new())
        .service(CancelOrderRoute::<MockBoxOffice, FakeGateway>::new())
        .service(TicketsRoute::<MockBoxOffice, FakeGateway>::new())
        .app_data(web::Data::new(api));
}

fn configure_declines(cfg: &mut ServiceConfig) {
    let mut db = MockBoxOffice::new();
    db.expect_fetch_products().returning(|_| Ok(ProductSet::from(vec![adult_ticket()])));
    db.expect_insert_order().returning(|mut order, tokens| {
        order.id = Some(OrderId(11));
        order.token = Some(tokens.next_token());
        Ok(order)
    });
    db.expect_delete_order().times(1).returning(|_| Ok(()));
    let gateway = FakeGateway::new();
    gateway.set_behaviour(GatewayBehaviour::Decline(Some("Your card was declined.".into())));
    let api = OrderFlowApi::new(db, gateway, EventProducers::default(), clock()).unwrap();
    cfg.service(PlaceOrderRoute::<MockBoxOffice, FakeGateway>::new()).app_data(web::Data::new(api));
}

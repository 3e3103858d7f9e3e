use actix_web::{http::StatusCode, web, web::ServiceConfig};
use box_office_engine::{
    db_types::ProductId,
    test_utils::fixtures::{adult_ticket, child_ticket, fall_concert, spring_concert, ADULT, CHILD, SPRING},
    CatalogApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{clock, get_request, post_request, DOOR_TOKEN, OFFICE_TOKEN, SETUP_TOKEN},
    mocks::MockBoxOffice,
};
use crate::routes::{AddPriceRuleRoute, CreateEventRoute, CreateProductRoute, ListEventsRoute, PriceListRoute};

#[actix_web::test]
async fn public_price_list() {
    let _ = env_logger::try_init().ok();
    let path = format!("/prices?p={ADULT},{CHILD},unknown&coupon=FRIENDS");
    let (status, body) = get_request("", &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let list: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(list["coupon"], true);
    let products = list["products"].as_array().unwrap();
    // Child tickets are only sold at the door
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], ADULT);
    assert_eq!(products[0]["price"], 2000);
}

#[actix_web::test]
async fn member_prices_need_a_session() {
    let _ = env_logger::try_init().ok();
    let path = format!("/prices?p={ADULT}&source=members");
    let (status, body) = get_request("", &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Forbidden"}"#);
}

#[actix_web::test]
async fn list_events_for_door_staff() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(DOOR_TOKEN, "/events", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let events: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(events[0]["id"], SPRING);
    assert_eq!(events[0]["free_entries"], json!(["Child"]));
    let err = get_request(OFFICE_TOKEN, "/events", configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
}

#[actix_web::test]
async fn create_event_needs_setup() {
    let _ = env_logger::try_init().ok();
    let event = serde_json::to_value(fall_concert()).unwrap();
    let err = post_request(DOOR_TOKEN, "/events", event.clone(), configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
    let (status, body) = post_request(SETUP_TOKEN, "/events", event, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["name"], "Fall Concert");
}

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init().ok();
    let product = json!({
        "id": ADULT,
        "name": "Spring Concert: Adult",
        "short_name": "Adult",
        "type": "ticket",
        "ticket_count": 1,
        "ticket_class": "Adult",
        "events": [{ "event": SPRING }],
        "rules": [{ "source": "public", "price": 2500 }]
    });
    let (status, body) = post_request(SETUP_TOKEN, "/products", product, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let stored: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stored["id"], ADULT);
    assert_eq!(stored["events"][0]["event"]["name"], "Spring Concert");
}

#[actix_web::test]
async fn overlapping_rules_are_refused() {
    let _ = env_logger::try_init().ok();
    let rule = json!({ "source": "public", "price": 1800 });
    let path = format!("/products/{ADULT}/rules");
    let (status, _) = post_request(SETUP_TOKEN, &path, rule.clone(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) =
        post_request(SETUP_TOKEN, "/products/nope/rules", rule, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Product nope does not exist"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockBoxOffice::new();
    db.expect_fetch_product().returning(|id| {
        Ok(match id.0.as_str() {
            ADULT => Some(adult_ticket()),
            CHILD => Some(child_ticket()),
            _ => None,
        })
    });
    db.expect_tickets_issued_for_event().returning(|_| Ok(10));
    db.expect_fetch_event().returning(|id| Ok((id.0 == SPRING).then(spring_concert)));
    db.expect_fetch_events_after().returning(|_| Ok(vec![spring_concert()]));
    db.expect_fetch_products_for_event().returning(|_| Ok(vec![adult_ticket(), child_ticket()]));
    db.expect_insert_event().returning(|_| Ok(()));
    db.expect_insert_product().withf(|p| p.id == ProductId::from(ADULT)).returning(|_| Ok(()));
    let api = CatalogApi::new(db, clock());
    cfg.service(PriceListRoute::<MockBoxOffice>::new())
        .service(ListEventsRoute::<MockBoxOffice>::new())
        .service(CreateEventRoute::<MockBoxOffice>::new())
        .service(CreateProductRoute::<MockBoxOffice>::new())
        .service(AddPriceRuleRoute::<MockBoxOffice>::new())
        .app_data(web::Data::new(api));
}

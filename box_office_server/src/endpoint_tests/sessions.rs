use actix_web::{http::StatusCode, web, web::ServiceConfig};
use box_office_engine::SessionApi;
use serde_json::{json, Value};

use super::{
    helpers::{clock, post_request, staff_sessions, DOOR_TOKEN, SETUP_TOKEN},
    mocks::MockBoxOffice,
};
use crate::routes::OpenSessionRoute;

#[actix_web::test]
async fn open_session() {
    let _ = env_logger::try_init().ok();
    let request = json!({ "username": "usher", "privileges": ["Admit"] });
    let (status, body) = post_request(SETUP_TOKEN, "/sessions", request, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["username"], "usher");
    assert_eq!(session["privileges"], json!(["Admit"]));
    assert_eq!(session["token"].as_str().map(str::len), Some(48));
}

#[actix_web::test]
async fn only_setup_staff_open_sessions() {
    let _ = env_logger::try_init().ok();
    let request = json!({ "username": "usher", "privileges": ["Setup"] });
    let err = post_request(DOOR_TOKEN, "/sessions", request.clone(), configure).await.expect_err("Expected error");
    assert_eq!(err, "Forbidden");
    let err = post_request("", "/sessions", request, configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication required");
}

#[actix_web::test]
async fn sessions_need_a_username() {
    let _ = env_logger::try_init().ok();
    let request = json!({ "username": "  ", "privileges": ["Sell"] });
    let (status, body) = post_request(SETUP_TOKEN, "/sessions", request, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"a username is required"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = staff_sessions();
    db.expect_insert_session().times(0..=1).returning(|_| Ok(()));
    cfg.service(OpenSessionRoute::<MockBoxOffice>::new()).app_data(web::Data::new(SessionApi::new(db, clock())));
}

use std::sync::Arc;

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use box_office_engine::{
    db_types::{Privilege, Session},
    helpers::{FixedClock, SharedClock},
    test_utils::fixtures::{door_staff, now, session, setup_staff},
    SessionApi,
};
use log::debug;

use super::mocks::MockBoxOffice;
use crate::middleware::{SessionMiddlewareFactory, AUTH_HEADER};

pub const DOOR_TOKEN: &str = "door-token";
pub const SETUP_TOKEN: &str = "setup-token";
pub const OFFICE_TOKEN: &str = "office-token";

pub fn clock() -> SharedClock {
    Arc::new(FixedClock::new(now()))
}

pub fn office_staff() -> Session {
    session(&[Privilege::HandleOrders], None)
}

/// A store that knows the three staff tokens above. Any other token is unknown.
pub fn staff_sessions() -> MockBoxOffice {
    let mut db = MockBoxOffice::new();
    db.expect_fetch_session().returning(|token, _| {
        Ok(match token {
            DOOR_TOKEN => Some(door_staff()),
            SETUP_TOKEN => Some(setup_staff()),
            OFFICE_TOKEN => Some(office_staff()),
            _ => None,
        })
    });
    db
}

pub fn configure_sessions(cfg: &mut ServiceConfig) {
    cfg.app_data(web::Data::new(SessionApi::new(staff_sessions(), clock())));
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::get().uri(path), auth_header, configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::post().uri(path).set_json(body), auth_header, configure).await
}

pub async fn delete_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::delete().uri(path), auth_header, configure).await
}

async fn send_request(
    mut req: TestRequest,
    auth_header: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !auth_header.is_empty() {
        req = req.insert_header((AUTH_HEADER, auth_header));
    }
    let req = req.to_request();
    let app = App::new()
        .wrap(SessionMiddlewareFactory::<MockBoxOffice>::new())
        .configure(configure_sessions)
        .configure(configure);

    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

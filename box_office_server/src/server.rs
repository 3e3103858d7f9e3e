use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use box_office_engine::{
    events::EventProducers,
    helpers::{SharedClock, SystemClock},
    CatalogApi,
    OrderFlowApi,
    SessionApi,
    SqliteDatabase,
    TicketUsageApi,
};
use log::*;
use stripe_tools::StripeApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{create_notification_event_handlers, StripeGateway},
    middleware::SessionMiddlewareFactory,
    routes::{
        health,
        AddPriceRuleRoute,
        ApplyUsageRoute,
        CalculateOrderRoute,
        CancelOrderRoute,
        CaptureOrderRoute,
        CreateEventRoute,
        CreateProductRoute,
        EventPricesRoute,
        ListEventsRoute,
        OpenSessionRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        PreviewUsageRoute,
        PriceListRoute,
        TerminalConnectionRoute,
        TicketsRoute,
        WillCallRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let stripe = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers(&config.notifications, config.event_buffer);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification handlers started");
    let clock: SharedClock = Arc::new(SystemClock);
    let srv = create_server_instance(config, db, stripe, producers, clock)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    stripe: StripeApi,
    producers: EventProducers,
    clock: SharedClock,
) -> Result<Server, ServerError> {
    // One order flow for all workers, so that every worker draws tokens from the same generator
    let gateway = StripeGateway::new(stripe.clone());
    let orders_api = OrderFlowApi::new(db.clone(), gateway, producers, clock.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let orders_api = web::Data::new(orders_api);
    let stripe = web::Data::new(stripe);
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone(), clock.clone());
        let usage_api = TicketUsageApi::new(db.clone(), clock.clone());
        let session_api = SessionApi::new(db.clone(), clock.clone());
        let api_scope = web::scope("/api")
            .service(PriceListRoute::<SqliteDatabase>::new())
            .service(CalculateOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(PlaceOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, StripeGateway>::new())
            .service(CaptureOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(CancelOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(TicketsRoute::<SqliteDatabase, StripeGateway>::new())
            .service(ListEventsRoute::<SqliteDatabase>::new())
            .service(CreateEventRoute::<SqliteDatabase>::new())
            .service(EventPricesRoute::<SqliteDatabase>::new())
            .service(WillCallRoute::<SqliteDatabase>::new())
            .service(PreviewUsageRoute::<SqliteDatabase>::new())
            .service(ApplyUsageRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(AddPriceRuleRoute::<SqliteDatabase>::new())
            .service(OpenSessionRoute::<SqliteDatabase>::new())
            .service(TerminalConnectionRoute::new());
        App::new()
            .wrap(SessionMiddlewareFactory::<SqliteDatabase>::new())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("box_office::access_log"))
            .app_data(orders_api.clone())
            .app_data(stripe.clone())
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(usage_api))
            .app_data(web::Data::new(session_api))
            .service(api_scope)
            .service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

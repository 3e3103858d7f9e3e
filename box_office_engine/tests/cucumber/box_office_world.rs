use std::sync::Arc;

use box_office_engine::{
    api::ticket_usage_api::UsagePreview,
    db_types::{EventId, Order},
    events::EventProducers,
    helpers::{FixedClock, TokenGenerator},
    test_utils::{
        fixtures::{self, FALL, SPRING},
        prepare_env::{create_database, random_db_path, run_migrations},
        FakeGateway,
    },
    OrderFlowApi,
    OrderLookup,
    SqliteDatabase,
    TicketUsageApi,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct BoxOfficeWorld {
    pub system: Option<BoxOfficeSystem>,
    pub order: Option<Order>,
    pub lookup: Option<OrderLookup>,
    pub preview: Option<UsagePreview>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BoxOfficeSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase, FakeGateway>,
    pub usage: TicketUsageApi<SqliteDatabase>,
    pub clock: FixedClock,
}

impl BoxOfficeWorld {
    pub fn system(&self) -> &BoxOfficeSystem {
        self.system.as_ref().expect("Box office not initialised")
    }

    pub fn lookup(&self) -> &OrderLookup {
        self.lookup.as_ref().expect("No order has been scanned")
    }

    /// The scan session of the last preview.
    pub fn scan(&self) -> String {
        self.preview.as_ref().map(|p| p.scan.clone()).expect("No scan session is open")
    }
}

impl BoxOfficeSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        fixtures::seed_catalog(&db).await;
        let clock = FixedClock::new(fixtures::now());
        let shared = Arc::new(clock.clone());
        let orders = OrderFlowApi::new(db.clone(), FakeGateway::new(), EventProducers::default(), shared.clone())
            .expect("Error creating order flow")
            .with_token_generator(TokenGenerator::from_seed(7));
        let usage = TicketUsageApi::new(db.clone(), shared).with_token_generator(TokenGenerator::from_seed(11));
        Self { db_path: url, db, orders, usage, clock }
    }
}

/// Maps the concert names used in feature files to event ids.
pub fn concert(name: &str) -> EventId {
    match name {
        "spring" => EventId::from(SPRING),
        "fall" => EventId::from(FALL),
        other => EventId::from(other),
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}

//! Box Office Engine
//!
//! The engine holds the pricing and ticket lifecycle rules of a performing-arts box office. It is storage- and
//! gateway-agnostic; a SQLite backend ships with it behind the `sqlite` feature.
//!
//! The library is divided into three layers:
//! 1. Pure rules, free of I/O: price rule resolution ([`mod@pricing`]), order validation ([`mod@validation`]),
//!    ticket allocation ([`mod@allocation`]) and door-scan usage tracking ([`mod@usage`]).
//! 2. Backend contracts ([`mod@traits`]). Storage backends implement [`traits::TicketingDatabase`], card processors
//!    implement [`traits::PaymentGateway`].
//! 3. The public API ([`mod@api`]), which strings the rules and the backends together into the operations the HTTP
//!    server exposes.
//!
//! The engine also emits events when an order becomes valid or a pending order is cancelled. A simple actor framework
//! ([`mod@events`]) lets the server hook receipts and sheet syncing onto them.
pub mod allocation;
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod pricing;
pub mod traits;
pub mod usage;
pub mod validation;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    catalog_api::CatalogApi,
    errors::{CatalogError, OrderFlowError, SessionError, TicketUsageError},
    order_flow_api::OrderFlowApi,
    session_api::SessionApi,
    ticket_usage_api::{OrderLookup, TicketUsageApi},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use traits::{CatalogManagement, OrderManagement, PaymentGateway, SessionProvider, StoreError, TicketingDatabase};

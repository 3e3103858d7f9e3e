//! # Backend contracts
//!
//! The engine never talks to a database or a card processor directly. It is written against the traits in this
//! module, and a backend (see [`crate::SqliteDatabase`]) or a gateway adapter supplies the implementation.
//!
//! * [`CatalogManagement`] covers events, products and their price rules.
//! * [`OrderManagement`] persists the order graph (lines, tickets, payments) and the card holder directory.
//! * [`SessionProvider`] resolves bearer tokens into [`crate::db_types::Session`]s.
//! * [`PaymentGateway`] is the card processor seen from the order flow.
//!
//! [`TicketingDatabase`] bundles the three storage traits, and is what the API structs ask for.
mod catalog_management;
mod order_management;
mod payment_gateway;
mod session_provider;
mod store_error;

pub use catalog_management::CatalogManagement;
pub use order_management::OrderManagement;
pub use payment_gateway::{CardSettlement, ChargeOutcome, GatewayError, PaymentGateway, PaymentIntent};
pub use session_provider::SessionProvider;
pub use store_error::StoreError;

/// Everything a complete box office backend provides.
pub trait TicketingDatabase: CatalogManagement + OrderManagement + SessionProvider {}

impl<T> TicketingDatabase for T where T: CatalogManagement + OrderManagement + SessionProvider {}

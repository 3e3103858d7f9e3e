//! # Box office public API
//!
//! The `api` module exposes the programmatic API of the engine. Each API struct is created from a storage backend
//! that implements the traits it needs (see [`crate::traits`]), so clients can pick the parts they want.
//!
//! * [`order_flow_api`] takes orders from draft to valid, including card settlement.
//! * [`ticket_usage_api`] drives door scanning.
//! * [`catalog_api`] manages events, products and price rules, and serves price lists and will-call lists.
//! * [`session_api`] issues and resolves bearer sessions.
//!
//! ```rust,ignore
//! use box_office_engine::{SqliteDatabase, TicketUsageApi, helpers::SystemClock};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = TicketUsageApi::new(db, Arc::new(SystemClock));
//! let preview = api.preview(&event, &OrderLookup::parse("1234-5678-9012"), Some(&session)).await?;
//! ```
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod session_api;
pub mod ticket_usage_api;

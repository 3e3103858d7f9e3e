//! SQLite backend for the box office engine.
//!
//! [`SqliteDatabase`] implements every storage trait in [`crate::traits`]. The low-level queries live in [`db`].
mod errors;
mod sqlite_impl;

pub mod db;
pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;

//! # Door-scan ticket usage
//!
//! When an order is scanned at the door, the usage tracker works out, per ticket class, how many tickets may be marked
//! used for the event being admitted, and then records the count the door staff settle on.
//!
//! Each class is described by three numbers:
//! * `min`: tickets already used in earlier scan sessions. These cannot be un-scanned.
//! * `max`: tickets issued for the class, or [`FREE_CLASS_MAX`] when the event offers the class for free.
//! * `used`: tickets currently marked used.
//!
//! Every scan session carries its own token. Tickets consumed during a session remember the token, so a mistake can be
//! undone within the same session but not later.
mod class_map;
mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use class_map::{class_map, ClassMap, FreeClasses};
pub use tracker::{apply_usage, preview_usage, DoorContext};

/// The `max` reported for a class that can always be topped up with free tickets.
pub const FREE_CLASS_MAX: u32 = 1000;

/// Usage bounds for one ticket class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassUsage {
    pub name: String,
    pub min: u32,
    pub max: u32,
    pub used: u32,
    /// The natural admission count did not fit in the tickets left.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overflow: bool,
}

/// One requested change: mark `used` tickets of `class` as used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRequest {
    pub class: String,
    pub used: u32,
}

impl UsageRequest {
    pub fn new<S: Into<String>>(class: S, used: u32) -> Self {
        Self { class: class.into(), used }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Not a ticket order")]
    NotATicketOrder,
    #[error("Wrong event")]
    WrongEvent,
    #[error("Ticket already used")]
    AlreadyUsed,
    #[error("reducing used count below minimum")]
    BelowMinimum,
    #[error("raising used count above maximum")]
    AboveMaximum,
}

impl UsageError {
    /// Errors that describe the scanned ticket rather than a bad request. Door apps show these to staff.
    pub fn is_informational(&self) -> bool {
        !matches!(self, UsageError::BelowMinimum | UsageError::AboveMaximum)
    }
}

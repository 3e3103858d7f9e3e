//! # Order validation
//!
//! [`OrderValidator::validate`] turns a caller-supplied order draft into a [`ValidatedOrder`]: priced against the
//! catalog, structurally sound and carrying a payment of the right shape for its source. The checks run in a fixed
//! order and stop at the first failure:
//!
//! 1. source and permission check ([`Rejection::Forbidden`]),
//! 2. line resolution against the strict price resolver,
//! 3. customer data,
//! 4. structural checks (system-assigned fields, quantities, per-type rules),
//! 5. payment amount and shape.
//!
//! Validation never touches storage. A rejected draft leaves no trace.
mod customer;
mod errors;
mod patterns;
mod payment;
mod validator;

pub use errors::Rejection;
pub use patterns::Patterns;
pub use validator::{OrderValidator, ValidatedOrder};

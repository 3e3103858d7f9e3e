//! Price-rule resolution.
//!
//! A product can carry many overlapping price rules. The [`PriceResolver`] picks the one that applies to a given
//! purchase context at a given instant. There are two variants:
//!
//! * [`PriceResolver::resolve`] is strict and is used when an order is admitted. Only a rule whose sales window is
//!   open right now can be returned (unless the caller may bypass sales windows).
//! * [`PriceResolver::preview`] is used for price display. It also considers rules whose window has not opened yet or
//!   has already closed, so that a helpful message can be shown instead of nothing.
mod resolver;

pub use resolver::{PriceResolver, PricePreview, PurchaseContext, WindowPosition};

//! Adapters between the engine and the outside world: the card processor, and the notifications sent when an order
//! becomes valid.
mod notifications;
mod stripe;

pub use notifications::{create_notification_event_handlers, receipt_text, SheetRow};
pub use stripe::StripeGateway;

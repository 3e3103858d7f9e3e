//! Order lifecycle events.
//!
//! The engine publishes an event whenever an order reaches a terminal state. Anything that has to happen outside the
//! transactional core (receipts, spreadsheet sync) subscribes through [`EventHooks`]. Handlers are fire-and-forget:
//! the order is committed before the event is published and a failing handler never rolls anything back.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};

use super::StoreError;
use crate::{
    db_types::{CardHolder, EventId, Order, OrderId},
    helpers::TokenGenerator,
};

/// Persistence for the order graph. An order is always read and written as a whole: the order row together with its
/// lines, their tickets and the payments.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order in a single transaction and returns it with every id filled in.
    ///
    /// The order's token is drawn from `tokens`, and redrawn until it is not already taken. The stored order has
    /// revision 1.
    async fn insert_order(&self, order: Order, tokens: &TokenGenerator) -> Result<Order, StoreError>;

    /// Replaces the stored order graph with `order`.
    ///
    /// The write only goes ahead if the stored revision still equals `order.revision`, otherwise
    /// [`StoreError::ConcurrentModification`] is returned and nothing changes. The returned order carries the new
    /// revision.
    async fn update_order(&self, order: &Order) -> Result<Order, StoreError>;

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_token(&self, token: &str) -> Result<Option<Order>, StoreError>;

    /// Valid orders holding at least one ticket that is bound to, or could be used at, the event.
    async fn fetch_orders_for_event(&self, event: &EventId) -> Result<Vec<Order>, StoreError>;

    /// Remembers who last paid with a card. Existing entries are overwritten.
    async fn save_card_holder(&self, holder: &CardHolder) -> Result<(), StoreError>;

    async fn fetch_card_holder(&self, card: &str) -> Result<Option<CardHolder>, StoreError>;
}

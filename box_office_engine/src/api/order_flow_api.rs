use std::fmt::Debug;

use log::*;

use super::errors::OrderFlowError;
use crate::{
    allocation::TicketAllocator,
    db_types::{CardHolder, Order, OrderId, PaymentType, Privilege, ProductId, Session},
    events::{EventProducers, OrderCanceledEvent, OrderValidEvent},
    helpers::{SharedClock, TokenGenerator},
    traits::{CardSettlement, ChargeOutcome, PaymentGateway, StoreError, TicketingDatabase},
    validation::{OrderValidator, Rejection, ValidatedOrder},
};

/// Shown to the buyer whenever the gateway fails without a decline message of its own.
pub const PAYMENT_FALLBACK_MESSAGE: &str = "We're sorry, but our payment processor isn't working right now.  Please \
                                            try again later, or contact our office at (650) 254-1700.";

/// How a validated order gets from `Allocated` to `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementPath {
    /// Free orders and offline payments (cash, check, other). The order is stored valid straight away.
    NoPaymentNeeded,
    /// A card token or payment method is charged before the order becomes valid.
    Charging,
    /// A card-present authorisation is created. The order stays invalid until the payment is captured.
    AwaitingCapture,
}

impl SettlementPath {
    pub fn for_order(order: &Order) -> Self {
        match order.sole_payment().map(|p| p.payment_type) {
            Some(PaymentType::Card) => SettlementPath::Charging,
            Some(PaymentType::CardPresent) => SettlementPath::AwaitingCapture,
            _ => SettlementPath::NoPaymentNeeded,
        }
    }
}

/// `OrderFlowApi` takes orders from draft to valid: validation, ticket allocation, storage and payment settlement.
///
/// An order is stored before the card is charged, so that its tickets and token exist while the gateway is busy. If
/// the payment fails, the order is deleted again.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    validator: OrderValidator,
    allocator: TicketAllocator,
    tokens: TokenGenerator,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, clock: SharedClock) -> Result<Self, OrderFlowError> {
        let validator =
            OrderValidator::new(clock.clone()).map_err(|e| OrderFlowError::Configuration(e.to_string()))?;
        let allocator = TicketAllocator::new(clock);
        Ok(Self { db, gateway, producers, validator, allocator, tokens: TokenGenerator::new() })
    }

    /// Replaces the order token source. Tests use a seeded generator to get predictable tokens.
    pub fn with_token_generator(mut self, tokens: TokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    /// Validates and prices a draft without storing anything. The returned order carries the tickets it would be
    /// issued.
    pub async fn calculate_order(&self, draft: Order, caller: Option<&Session>) -> Result<Order, OrderFlowError> {
        let mut validated = self.validate(draft, caller).await?;
        self.allocator.allocate(&mut validated);
        Ok(validated.into_order())
    }

    /// Places a new order and settles its payment.
    ///
    /// Returns the stored order. Card-present orders come back not yet valid; they complete through
    /// [`Self::capture_order`] or are abandoned with [`Self::cancel_order`].
    pub async fn place_order(&self, draft: Order, caller: Option<&Session>) -> Result<Order, OrderFlowError> {
        let mut validated = self.validate(draft, caller).await?;
        self.allocator.allocate(&mut validated);
        let path = SettlementPath::for_order(validated.order());
        let mut order = validated.into_order();
        order.valid = path == SettlementPath::NoPaymentNeeded;
        let order = self.db.insert_order(order, &self.tokens).await?;
        let id = stored_id(&order)?;
        debug!("🔄️ Order {id} stored with {} ticket(s). Settling via {path:?}", order.ticket_count());
        match path {
            SettlementPath::NoPaymentNeeded => {
                self.order_became_valid(&order).await;
                Ok(order)
            },
            SettlementPath::Charging => self.charge(order).await,
            SettlementPath::AwaitingCapture => self.authorise(order).await,
        }
    }

    /// Captures the card-present payment of a pending order and makes the order valid.
    pub async fn capture_order(&self, id: OrderId, caller: Option<&Session>) -> Result<Order, OrderFlowError> {
        require_sell(caller)?;
        let mut order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        let reference = self
            .pending_intent(&order)
            .ok_or_else(|| Rejection::bad_request("order not in capturable state"))?;
        let settlement = self.gateway.capture(&reference).await.map_err(|e| {
            error!("🔄️💳️ Could not capture payment {reference} for order {id}: {e}");
            e
        })?;
        let card = settlement.card.clone();
        settle(&mut order, settlement);
        order.valid = true;
        let mut order = self.db.update_order(&order).await?;
        info!("🔄️💳️ Payment for order {id} captured");
        if order.email.is_none() {
            // Only for the response and the receipt. The stored order keeps no email.
            if let Some(holder) = self.card_holder(card.as_deref()).await {
                order.email = holder.email;
            }
        }
        self.order_became_valid(&order).await;
        Ok(order)
    }

    /// Cancels the card-present authorisation of a pending order and deletes the order.
    pub async fn cancel_order(&self, id: OrderId, caller: Option<&Session>) -> Result<(), OrderFlowError> {
        require_sell(caller)?;
        let order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        let reference =
            self.pending_intent(&order).ok_or_else(|| Rejection::bad_request("order not in cancelable state"))?;
        self.gateway.cancel_intent(&reference).await.map_err(|e| {
            error!("🔄️💳️ Could not cancel payment {reference} for order {id}: {e}");
            e
        })?;
        self.db.delete_order(id).await?;
        info!("🔄️ Pending order {id} cancelled");
        self.producers.publish_order_canceled(OrderCanceledEvent::new(order)).await;
        Ok(())
    }

    /// Office staff can look at any order.
    pub async fn fetch_order(&self, id: OrderId, caller: Option<&Session>) -> Result<Order, OrderFlowError> {
        match caller {
            Some(session) if session.has(Privilege::HandleOrders) => {},
            _ => return Err(Rejection::Forbidden.into()),
        }
        self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))
    }

    /// The order behind a ticket token, as shown to whoever holds the token. Office notes and the gateway customer
    /// are left out.
    pub async fn fetch_tickets(&self, token: &str) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order_by_token(token).await?.filter(|o| o.valid);
        Ok(order.map(|mut o| {
            o.office_note = None;
            o.customer = None;
            o
        }))
    }

    async fn validate(&self, draft: Order, caller: Option<&Session>) -> Result<ValidatedOrder, OrderFlowError> {
        let ids = draft.lines.iter().map(|l| l.product.clone()).collect::<Vec<ProductId>>();
        let products = self.db.fetch_products(&ids).await?;
        let validated = self.validator.validate(draft, &products, caller)?;
        Ok(validated)
    }

    async fn charge(&self, mut order: Order) -> Result<Order, OrderFlowError> {
        let id = stored_id(&order)?;
        let payment = order.sole_payment().cloned().ok_or_else(|| Rejection::bad_request("invalid payment"))?;
        let settlement = match self.gateway.charge(&order, &payment).await {
            Ok(ChargeOutcome::Approved(settlement)) => settlement,
            Ok(ChargeOutcome::Declined(message)) => {
                info!("🔄️💳️ Card payment for order {id} was declined: {message:?}");
                self.abandon(id).await;
                let message = message.unwrap_or_else(|| PAYMENT_FALLBACK_MESSAGE.to_string());
                return Err(OrderFlowError::PaymentDeclined(message));
            },
            Err(e) => {
                error!("🔄️💳️ Card payment for order {id} failed: {e}");
                self.abandon(id).await;
                return Err(OrderFlowError::PaymentDeclined(PAYMENT_FALLBACK_MESSAGE.to_string()));
            },
        };
        let card = settlement.card.clone();
        settle(&mut order, settlement);
        order.valid = true;
        self.remember_card_holder(&mut order, card.as_deref()).await;
        let order = self.db.update_order(&order).await?;
        info!("🔄️💳️ Card payment for order {id} approved");
        self.order_became_valid(&order).await;
        Ok(order)
    }

    async fn authorise(&self, mut order: Order) -> Result<Order, OrderFlowError> {
        let id = stored_id(&order)?;
        let payment = order.sole_payment().cloned().ok_or_else(|| Rejection::bad_request("invalid payment"))?;
        let intent = match self.gateway.create_intent(&order, &payment).await {
            Ok(intent) => intent,
            Err(e) => {
                error!("🔄️💳️ Could not create a payment intent for order {id}: {e}");
                self.abandon(id).await;
                return Err(OrderFlowError::PaymentDeclined(PAYMENT_FALLBACK_MESSAGE.to_string()));
            },
        };
        if let Some(p) = order.payments.first_mut() {
            p.method = Some(intent.client_secret);
            p.reference = Some(intent.reference);
        }
        let order = self.db.update_order(&order).await?;
        debug!("🔄️💳️ Order {id} is waiting for its card-present payment to be captured");
        Ok(order)
    }

    /// The intent reference of an order that is waiting for capture, if it is in that state.
    fn pending_intent(&self, order: &Order) -> Option<String> {
        if order.valid {
            return None;
        }
        let payment = order.sole_payment().filter(|p| p.payment_type == PaymentType::CardPresent)?;
        let patterns = self.validator.patterns();
        if !patterns.is_payment_intent(payment.method.as_deref()) {
            return None;
        }
        payment.reference.clone().filter(|r| patterns.is_payment_intent(Some(r)))
    }

    /// Deletes an order whose payment failed. Failures are logged; the caller is already reporting an error.
    async fn abandon(&self, id: OrderId) {
        if let Err(e) = self.db.delete_order(id).await {
            error!("🔄️ Could not delete order {id} after its payment failed: {e}");
        }
    }

    async fn card_holder(&self, card: Option<&str>) -> Option<CardHolder> {
        let card = card?;
        match self.db.fetch_card_holder(card).await {
            Ok(holder) => holder,
            Err(e) => {
                warn!("🔄️ Could not look up the holder of card {card}: {e}");
                None
            },
        }
    }

    /// Fills a missing name or email from what we know about the card, then stores the merged identity.
    async fn remember_card_holder(&self, order: &mut Order, card: Option<&str>) {
        let Some(card) = card else {
            return;
        };
        if let Some(known) = self.card_holder(Some(card)).await {
            if order.name.is_none() {
                order.name = known.name;
            }
            if order.email.is_none() {
                order.email = known.email;
            }
        }
        if order.name.is_none() && order.email.is_none() {
            return;
        }
        let holder = CardHolder { card: card.to_string(), name: order.name.clone(), email: order.email.clone() };
        if let Err(e) = self.db.save_card_holder(&holder).await {
            warn!("🔄️ Could not remember the holder of card {card}: {e}");
        }
    }

    async fn order_became_valid(&self, order: &Order) {
        trace!("🔄️📬️ Publishing order valid event for {:?}", order.id);
        let ids = order.lines.iter().map(|l| l.product.clone()).collect::<Vec<ProductId>>();
        let event = match self.db.fetch_products(&ids).await {
            Ok(products) => OrderValidEvent::new(order.clone()).with_products(&products),
            Err(e) => {
                warn!("🔄️📬️ Could not look up the products of order {:?} for its receipt: {e}", order.id);
                OrderValidEvent::new(order.clone())
            },
        };
        self.producers.publish_order_valid(event).await;
    }
}

fn require_sell(caller: Option<&Session>) -> Result<(), Rejection> {
    match caller {
        Some(session) if session.has(Privilege::Sell) => Ok(()),
        _ => Err(Rejection::Forbidden),
    }
}

fn stored_id(order: &Order) -> Result<OrderId, OrderFlowError> {
    let missing = || StoreError::InvalidData("the store returned an order without an id".into());
    Ok(order.id.ok_or_else(missing)?)
}

/// Copies the gateway's description of a settled payment onto the order's payment.
fn settle(order: &mut Order, settlement: CardSettlement) {
    if let Some(p) = order.payments.first_mut() {
        p.reference = Some(settlement.reference);
        p.method = Some(settlement.method);
        p.subtype = settlement.subtype;
    }
}

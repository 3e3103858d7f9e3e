use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, Payment};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("The payment gateway sent an unexpected response: {0}")]
    InvalidResponse(String),
}

/// What the gateway tells us about a settled card payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSettlement {
    /// The gateway's charge or payment intent id.
    pub reference: String,
    /// Human-readable card description, e.g. `Visa 4242`.
    pub method: String,
    /// Wallet or card-reader detail, if any.
    pub subtype: Option<String>,
    /// Card fingerprint. Used to remember the card holder across orders.
    pub card: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved(CardSettlement),
    /// The card was refused. The message, when present, is safe to show to the buyer.
    Declined(Option<String>),
}

/// A card-present payment that has been authorised but not yet captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub reference: String,
    /// Handed to the card reader so that it can collect the card.
    pub client_secret: String,
}

/// The card processor, as seen from the order flow.
///
/// Only three flows are supported: an immediate charge of a tokenised card, and a card-present authorisation that is
/// later captured or cancelled.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Charges the payment's card token or payment method for the payment amount.
    async fn charge(&self, order: &Order, payment: &Payment) -> Result<ChargeOutcome, GatewayError>;

    /// Creates a manual-capture intent for a card-present payment.
    async fn create_intent(&self, order: &Order, payment: &Payment) -> Result<PaymentIntent, GatewayError>;

    /// Captures a previously authorised intent. `reference` is the intent id.
    async fn capture(&self, reference: &str) -> Result<CardSettlement, GatewayError>;

    async fn cancel_intent(&self, reference: &str) -> Result<(), GatewayError>;
}

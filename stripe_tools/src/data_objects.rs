use serde::{Deserialize, Serialize};

use crate::{helpers::card_description, StripeApiError};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub latest_charge: Option<ChargeRef>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// The expanded latest charge. Requests that need it ask for `expand[]=latest_charge`.
    pub fn charge(&self) -> Result<&Charge, StripeApiError> {
        match &self.latest_charge {
            Some(ChargeRef::Expanded(charge)) => Ok(charge),
            _ => Err(StripeApiError::MissingField("latest_charge")),
        }
    }
}

/// Stripe returns related objects as a bare id unless they are expanded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ChargeRef {
    Id(String),
    Expanded(Box<Charge>),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub payment_method_details: Option<PaymentMethodDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentMethodDetails {
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
    #[serde(default)]
    pub card_present: Option<CardPresentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardDetails {
    pub brand: String,
    pub last4: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub wallet: Option<Wallet>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Wallet {
    #[serde(rename = "type")]
    pub wallet_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardPresentDetails {
    pub brand: String,
    pub last4: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub read_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentMethod {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionToken {
    pub secret: String,
}

/// What the box office records about a settled card payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettledCharge {
    pub charge_id: String,
    /// e.g. "Visa 4242"
    pub description: String,
    /// Wallet type for card payments, read method for card-present ones.
    pub subtype: Option<String>,
    pub fingerprint: Option<String>,
}

impl Charge {
    pub fn settle(&self) -> Result<SettledCharge, StripeApiError> {
        let details =
            self.payment_method_details.as_ref().ok_or(StripeApiError::MissingField("payment_method_details"))?;
        if let Some(card) = &details.card {
            return Ok(SettledCharge {
                charge_id: self.id.clone(),
                description: card_description(&card.brand, &card.last4),
                subtype: card.wallet.as_ref().map(|w| w.wallet_type.clone()),
                fingerprint: card.fingerprint.clone(),
            });
        }
        if let Some(card) = &details.card_present {
            return Ok(SettledCharge {
                charge_id: self.id.clone(),
                description: card_description(&card.brand, &card.last4),
                subtype: card.read_method.clone(),
                fingerprint: card.fingerprint.clone(),
            });
        }
        Err(StripeApiError::MissingField("card details"))
    }
}

/// The body Stripe sends with every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

use box_office_engine::{
    db_types::{Order, Payment},
    traits::{CardSettlement, ChargeOutcome, GatewayError, PaymentGateway, PaymentIntent},
};
use log::*;
use stripe_tools::{SettledCharge, StripeApi, StripeApiError};

/// [`PaymentGateway`] over the Stripe payment-intent API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(api: StripeApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for StripeGateway {
    async fn charge(&self, order: &Order, payment: &Payment) -> Result<ChargeOutcome, GatewayError> {
        let number = order_number(order)?;
        let method = payment
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| GatewayError::Rejected("the payment carries no card token".into()))?;
        match self.api.charge_card(payment.amount, number, method).await {
            Ok(charge) => Ok(ChargeOutcome::Approved(settlement(charge))),
            Err(StripeApiError::CardError(message)) => Ok(ChargeOutcome::Declined(Some(message))),
            Err(StripeApiError::UnexpectedStatus { id, status }) => {
                warn!("💳️ Payment intent {id} for order {number} ended up {status}");
                Ok(ChargeOutcome::Declined(None))
            },
            Err(e) => Err(gateway_error(e)),
        }
    }

    async fn create_intent(&self, order: &Order, payment: &Payment) -> Result<PaymentIntent, GatewayError> {
        let number = order_number(order)?;
        let intent = self.api.create_card_present_intent(payment.amount, number).await.map_err(gateway_error)?;
        let client_secret =
            intent.client_secret.ok_or_else(|| GatewayError::InvalidResponse("no client secret".into()))?;
        Ok(PaymentIntent { reference: intent.id, client_secret })
    }

    async fn capture(&self, reference: &str) -> Result<CardSettlement, GatewayError> {
        let charge = self.api.capture_payment_intent(reference).await.map_err(gateway_error)?;
        Ok(settlement(charge))
    }

    async fn cancel_intent(&self, reference: &str) -> Result<(), GatewayError> {
        self.api.cancel_payment_intent(reference).await.map_err(gateway_error)?;
        Ok(())
    }
}

fn order_number(order: &Order) -> Result<i64, GatewayError> {
    order.id.map(|id| id.0).ok_or_else(|| GatewayError::Rejected("the order has not been stored".into()))
}

fn settlement(charge: SettledCharge) -> CardSettlement {
    CardSettlement {
        reference: charge.charge_id,
        method: charge.description,
        subtype: charge.subtype,
        card: charge.fingerprint,
    }
}

fn gateway_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::Initialization(_) | StripeApiError::RestResponseError(_) => {
            GatewayError::Unavailable(e.to_string())
        },
        StripeApiError::QueryError { status, .. } if status >= 500 => GatewayError::Unavailable(e.to_string()),
        StripeApiError::QueryError { .. } | StripeApiError::CardError(_) => GatewayError::Rejected(e.to_string()),
        StripeApiError::JsonError(_) | StripeApiError::UnexpectedStatus { .. } | StripeApiError::MissingField(_) => {
            GatewayError::InvalidResponse(e.to_string())
        },
    }
}

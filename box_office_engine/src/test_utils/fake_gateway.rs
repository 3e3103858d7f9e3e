use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
    Mutex,
};

use log::*;

use crate::{
    db_types::{Order, Payment},
    traits::{CardSettlement, ChargeOutcome, GatewayError, PaymentGateway, PaymentIntent},
};

/// What the fake gateway does with the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GatewayBehaviour {
    #[default]
    Approve,
    Decline(Option<String>),
    /// The gateway cannot be reached.
    Fail,
}

/// A payment gateway that settles everything in memory. Clones share their state, so a test can keep a handle while
/// the API owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    behaviour: Arc<Mutex<GatewayBehaviour>>,
    card: Arc<Mutex<Option<String>>>,
    counter: Arc<AtomicU32>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behaviour(&self, behaviour: GatewayBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// The card fingerprint reported with every settlement.
    pub fn set_card<S: Into<String>>(&self, card: Option<S>) {
        *self.card.lock().unwrap() = card.map(Into::into);
    }

    /// Every call made so far, as `"<operation> <reference>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn behaviour(&self) -> GatewayBehaviour {
        self.behaviour.lock().unwrap().clone()
    }

    fn card(&self) -> Option<String> {
        self.card.lock().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}_test{n:04}")
    }

    fn record(&self, call: String) {
        trace!("💳️ Fake gateway: {call}");
        self.calls.lock().unwrap().push(call);
    }

    fn check_reachable(&self) -> Result<(), GatewayError> {
        match self.behaviour() {
            GatewayBehaviour::Fail => Err(GatewayError::Unavailable("fake gateway is offline".into())),
            _ => Ok(()),
        }
    }
}

impl PaymentGateway for FakeGateway {
    async fn charge(&self, order: &Order, payment: &Payment) -> Result<ChargeOutcome, GatewayError> {
        self.record(format!("charge {:?} {}", order.id, payment.amount));
        self.check_reachable()?;
        match self.behaviour() {
            GatewayBehaviour::Decline(message) => Ok(ChargeOutcome::Declined(message)),
            _ => Ok(ChargeOutcome::Approved(CardSettlement {
                reference: self.next_id("ch"),
                method: "Visa 4242".into(),
                subtype: None,
                card: self.card(),
            })),
        }
    }

    async fn create_intent(&self, order: &Order, payment: &Payment) -> Result<PaymentIntent, GatewayError> {
        self.record(format!("intent {:?} {}", order.id, payment.amount));
        self.check_reachable()?;
        let reference = self.next_id("pi");
        let client_secret = format!("{reference}_secret_fake");
        Ok(PaymentIntent { reference, client_secret })
    }

    async fn capture(&self, reference: &str) -> Result<CardSettlement, GatewayError> {
        self.record(format!("capture {reference}"));
        self.check_reachable()?;
        Ok(CardSettlement {
            reference: reference.to_string(),
            method: "MasterCard 4444".into(),
            subtype: Some("contact_emv".into()),
            card: self.card(),
        })
    }

    async fn cancel_intent(&self, reference: &str) -> Result<(), GatewayError> {
        self.record(format!("cancel {reference}"));
        self.check_reachable()
    }
}

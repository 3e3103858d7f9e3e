use log::*;

use super::{OrderValidator, Rejection};
use crate::db_types::{Order, OrderSource, Payment, PaymentType};

impl OrderValidator {
    /// The order must carry exactly one payment for its total, unless the total is zero. A zero payment is accepted
    /// only as cash or other and is then dropped.
    pub(super) fn check_payment(&self, order: &mut Order) -> Result<(), Rejection> {
        let total = order.total();
        if total.is_zero() && order.payments.is_empty() {
            return Ok(());
        }
        let Some(payment) = order.sole_payment() else {
            debug!("🔄️ Order has {} payments, expected one", order.payments.len());
            return Err(invalid_payment());
        };
        if payment.id.is_some() || payment.reference.is_some() || payment.created.is_some() || payment.amount != total
        {
            debug!("🔄️ Payment of {} does not match the order total of {total}", payment.amount);
            return Err(invalid_payment());
        }
        if payment.amount.is_zero() {
            if !matches!(payment.payment_type, PaymentType::Cash | PaymentType::Other) {
                return Err(invalid_payment());
            }
            order.payments.clear();
            return Ok(());
        }
        if !self.payment_fits_source(order.source, payment) {
            debug!("🔄️ A {} payment is not accepted for {} orders", payment.payment_type, order.source);
            return Err(invalid_payment());
        }
        let created = order.created;
        order.payments.iter_mut().for_each(|p| p.created = created);
        Ok(())
    }

    fn payment_fits_source(&self, source: OrderSource, payment: &Payment) -> bool {
        let method = payment.method.as_deref();
        let is_method = method.is_some_and(|m| self.patterns.payment_method.is_match(m));
        match (source, payment.payment_type) {
            (OrderSource::Public | OrderSource::Members, PaymentType::Card) => is_method,
            (OrderSource::Public | OrderSource::Members | OrderSource::Gala, _) => false,
            (OrderSource::Office, PaymentType::Card) => is_method,
            (OrderSource::Office, PaymentType::Cash | PaymentType::Check | PaymentType::Other) => method.is_some(),
            (OrderSource::Office, PaymentType::CardPresent) => false,
            (OrderSource::InPerson, PaymentType::Card) => {
                is_method || method.is_some_and(|m| self.patterns.card_token.is_match(m))
            },
            (OrderSource::InPerson, PaymentType::CardPresent | PaymentType::Cash | PaymentType::Check) => {
                method.is_none()
            },
            (OrderSource::InPerson, PaymentType::Other) => false,
        }
    }
}

fn invalid_payment() -> Rejection {
    Rejection::bad_request("invalid payment")
}

use super::{OrderValidator, Rejection};
use crate::db_types::{Order, OrderSource, ProductSet, ProductType};

fn invalid(field: &str) -> Rejection {
    Rejection::bad_request(format!("invalid customer data: {field}"))
}

impl OrderValidator {
    /// Customer identity and address checks. In-person sales may be anonymous; everything else needs a name and a
    /// well-formed email.
    pub(super) fn check_customer(&self, order: &Order, products: &ProductSet) -> Result<(), Rejection> {
        let anonymous_ok = order.source == OrderSource::InPerson;
        if order.name.is_none() && !anonymous_ok {
            return Err(invalid("name"));
        }
        match order.email.as_deref() {
            Some(email) if !self.patterns.email.is_match(email) => return Err(invalid("email")),
            None if !anonymous_ok => return Err(invalid("email")),
            _ => {},
        }
        let address = [&order.address, &order.city, &order.state, &order.zip];
        let given = address.iter().filter(|f| f.is_some()).count();
        if given != 0 && given != address.len() {
            return Err(invalid("address"));
        }
        if order.state.as_deref().is_some_and(|s| !self.patterns.state.is_match(s)) {
            return Err(invalid("state"));
        }
        if order.zip.as_deref().is_some_and(|z| !self.patterns.zip.is_match(z)) {
            return Err(invalid("zip"));
        }
        if let Some(customer) = order.customer.as_deref() {
            // Stored gateway customers belong to the gala flow, which is closed. Even well-formed references are
            // turned away.
            let reason = if self.patterns.customer.is_match(customer) { "customer" } else { "customer reference" };
            return Err(invalid(reason));
        }
        let product_type = |id| products.get(id).map(|p| p.product_type);
        if let [line] = order.lines.as_slice() {
            if product_type(&line.product) == Some(ProductType::Donation) && order.address.is_none() {
                return Err(invalid("address"));
            }
        }
        let members_only_goods = order
            .lines
            .iter()
            .any(|l| matches!(product_type(&l.product), Some(ProductType::Recording | ProductType::SheetMusic)));
        if members_only_goods && order.member.is_none() {
            return Err(invalid("member"));
        }
        Ok(())
    }
}

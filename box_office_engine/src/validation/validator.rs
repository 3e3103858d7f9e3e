use log::*;

use super::{Patterns, Rejection};
use crate::{
    db_types::{Order, OrderSource, Privilege, ProductSet, ProductType, Session},
    helpers::SharedClock,
    pricing::{PriceResolver, PurchaseContext},
};

/// An order that passed every check. Prices are confirmed, zero-quantity lines are gone, `created` is stamped and the
/// payment (if any) has the right shape for the order source. Tickets have not been allocated yet.
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    order: Order,
    products: ProductSet,
}

impl ValidatedOrder {
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// The catalog entries for every product on the order.
    pub fn products(&self) -> &ProductSet {
        &self.products
    }

    pub fn into_order(self) -> Order {
        self.order
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Order, &ProductSet) {
        (&mut self.order, &self.products)
    }
}

pub struct OrderValidator {
    pub(super) patterns: Patterns,
    resolver: PriceResolver,
}

impl OrderValidator {
    pub fn new(clock: SharedClock) -> Result<Self, regex::Error> {
        Ok(Self { patterns: Patterns::new()?, resolver: PriceResolver::new(clock) })
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Runs every check against `draft`, looking products up in `products`. `caller` is the session of whoever is
    /// placing the order, if any.
    pub fn validate(
        &self,
        draft: Order,
        products: &ProductSet,
        caller: Option<&Session>,
    ) -> Result<ValidatedOrder, Rejection> {
        let mut order = draft;
        clear_blank_fields(&mut order);
        check_source_permissions(&mut order, caller).map_err(|e| {
            warn!("🔄️ Forbidden {} order from {}", order.source, caller_name(caller));
            e
        })?;
        self.resolve_lines(&mut order, products, caller)?;
        self.check_customer(&order, products)?;
        self.check_details(&mut order, products, caller)?;
        self.check_payment(&mut order)?;
        let products = order
            .lines
            .iter()
            .filter_map(|l| products.get(&l.product).cloned())
            .collect::<Vec<_>>()
            .into();
        trace!("🔄️ {} order for {} validated with total {}", order.source, caller_name(caller), order.total());
        Ok(ValidatedOrder { order, products })
    }

    /// Checks every line's price against the catalog. Donations and auction items carry the buyer's price; everything
    /// else must match the rule picked by the strict resolver. Clears the order coupon unless a resolved rule
    /// confirms it.
    fn resolve_lines(
        &self,
        order: &mut Order,
        products: &ProductSet,
        caller: Option<&Session>,
    ) -> Result<(), Rejection> {
        let mut confirmed = false;
        let ctx = PurchaseContext::for_order(order, caller);
        for line in &order.lines {
            let product = products
                .get(&line.product)
                .ok_or_else(|| Rejection::bad_request(format!("invalid products or prices: unknown product {}", line.product)))?;
            if product.product_type.has_buyer_price() {
                if !line.price.is_positive() {
                    return Err(Rejection::bad_request(format!(
                        "invalid products or prices: {} needs a positive amount",
                        product.id
                    )));
                }
                continue;
            }
            let rule = self.resolver.resolve(&product.rules, &ctx).ok_or_else(|| {
                Rejection::bad_request(format!("invalid products or prices: {} is not on sale", product.id))
            })?;
            if rule.has_coupon() {
                confirmed = true;
            }
            if rule.price != line.price {
                debug!("🏷️ Price for {} is {}, but the order says {}", product.id, rule.price, line.price);
                return Err(Rejection::bad_request(format!("invalid products or prices: wrong price for {}", product.id)));
            }
        }
        if !confirmed && order.coupon.take().is_some() {
            trace!("🏷️ Coupon was not confirmed by any line. Clearing it.");
        }
        Ok(())
    }

    fn check_details(
        &self,
        order: &mut Order,
        products: &ProductSet,
        caller: Option<&Session>,
    ) -> Result<(), Rejection> {
        let invalid = |reason: &str| Rejection::bad_request(format!("invalid parameters: {reason}"));
        if order.id.is_some() || order.token.is_some() || order.created.is_some() {
            return Err(invalid("new orders cannot carry an id, token or creation time"));
        }
        if order.lines.is_empty() {
            return Err(invalid("order has no lines"));
        }
        if order.office_note.is_some() && !caller.is_some_and(|s| s.has(Privilege::HandleOrders)) {
            return Err(invalid("office notes are reserved for office staff"));
        }
        if order.lines.iter().any(|l| l.quantity < 0) {
            return Err(invalid("negative quantity"));
        }
        order.lines.retain(|l| l.quantity != 0);
        if order.lines.is_empty() {
            return Err(invalid("order has no lines"));
        }
        for line in &order.lines {
            if line.id.is_some() || !line.tickets.is_empty() {
                return Err(invalid("order lines cannot carry an id or tickets"));
            }
            let product = products.get(&line.product).ok_or_else(|| invalid("unknown product"))?;
            let back_entry = line.used != 0 || line.used_at.is_some();
            match product.product_type {
                ProductType::AuctionItem => return Err(invalid("auction items cannot be ordered here")),
                t if t.is_single_unit() => {
                    if line.quantity != 1 || back_entry {
                        return Err(invalid(&format!("{} must have a quantity of one", product.id)));
                    }
                },
                ProductType::Wardrobe => {
                    if back_entry {
                        return Err(invalid(&format!("{} cannot be marked used", product.id)));
                    }
                },
                ProductType::Ticket => {
                    let issued = i64::from(line.quantity) * i64::from(product.ticket_count);
                    if line.used < 0 || i64::from(line.used) > issued {
                        return Err(invalid(&format!("used count for {} is out of range", product.id)));
                    }
                    if line.used != 0 {
                        let known = line.used_at.as_ref().is_some_and(|e| product.binding_for(e).is_some());
                        if !known {
                            return Err(invalid(&format!("{} is not valid at the event it was used at", product.id)));
                        }
                    }
                },
                _ => {},
            }
        }
        order.created = Some(self.resolver.now());
        Ok(())
    }
}

fn caller_name(caller: Option<&Session>) -> &str {
    caller.map(|s| s.username.as_str()).unwrap_or("anonymous")
}

fn clear_blank(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *field = None;
    }
}

/// Empty strings coming off the wire mean "not supplied".
fn clear_blank_fields(order: &mut Order) {
    for field in [
        &mut order.token,
        &mut order.name,
        &mut order.email,
        &mut order.address,
        &mut order.city,
        &mut order.state,
        &mut order.zip,
        &mut order.phone,
        &mut order.customer,
        &mut order.customer_note,
        &mut order.office_note,
        &mut order.coupon,
    ] {
        clear_blank(field);
    }
    for payment in &mut order.payments {
        clear_blank(&mut payment.method);
        clear_blank(&mut payment.subtype);
        clear_blank(&mut payment.reference);
    }
}

/// Each source has its own authorization rule. Fills in the member reference where the session implies one.
fn check_source_permissions(order: &mut Order, caller: Option<&Session>) -> Result<(), Rejection> {
    match order.source {
        OrderSource::Public => {
            if order.member.is_some() {
                return Err(Rejection::Forbidden);
            }
        },
        OrderSource::Members => {
            let session = caller.ok_or(Rejection::Forbidden)?;
            if order.member.is_some() && order.member != session.member {
                return Err(Rejection::Forbidden);
            }
            order.member = session.member;
        },
        OrderSource::Gala => return Err(Rejection::Forbidden),
        OrderSource::Office => {
            let session = caller.filter(|s| s.has(Privilege::HandleOrders)).ok_or(Rejection::Forbidden)?;
            if order.member.is_some_and(|m| m.0 < 0) {
                return Err(Rejection::Forbidden);
            }
            if order.member.is_none() {
                order.member = session.member;
            }
        },
        OrderSource::InPerson => {
            caller.filter(|s| s.has(Privilege::Sell)).ok_or(Rejection::Forbidden)?;
            if order.member.is_some() {
                return Err(Rejection::Forbidden);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use box_office_common::Cents;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        db_types::{
            Event,
            MemberId,
            OrderLine,
            Payment,
            PaymentType,
            PriceRule,
            Privileges,
            Product,
            ProductEvent,
        },
        helpers::FixedClock,
    };

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn validator() -> OrderValidator {
        OrderValidator::new(Arc::new(FixedClock::new(now()))).unwrap()
    }

    fn catalog() -> ProductSet {
        let concert = Event { id: "spring".into(), name: "Spring Concert".into(), start: now() + Duration::days(10), capacity: 0 };
        let adult = Product {
            id: "adult".into(),
            name: "Adult Ticket".into(),
            product_type: ProductType::Ticket,
            ticket_count: 1,
            ticket_class: "Adult".into(),
            events: vec![ProductEvent { event: concert, priority: 0 }],
            rules: vec![
                PriceRule::new(OrderSource::Public, Cents::from(2500)),
                PriceRule::new(OrderSource::Public, Cents::from(2000)).with_coupon("FRIENDS"),
                PriceRule::new(OrderSource::InPerson, Cents::from(3000)),
                PriceRule::new(OrderSource::Office, Cents::from(2500)),
            ],
            ..Default::default()
        };
        let donation = Product {
            id: "donation".into(),
            name: "Donation".into(),
            product_type: ProductType::Donation,
            ..Default::default()
        };
        let recording = Product {
            id: "recording".into(),
            name: "Concert Recording".into(),
            product_type: ProductType::Recording,
            rules: vec![PriceRule::new(OrderSource::Members, Cents::from(0))],
            ..Default::default()
        };
        vec![adult, donation, recording].into()
    }

    fn public_order(quantity: i32, price: i64) -> Order {
        let mut order = Order::new(OrderSource::Public);
        order.name = Some("Jane Doe".into());
        order.email = Some("jane@example.org".into());
        order.lines.push(OrderLine::new("adult".into(), quantity, Cents::from(price)));
        let total = Cents::from(price) * i64::from(quantity);
        if total.is_positive() {
            order.payments.push(Payment::new(PaymentType::Card, total).with_method("pm_123abc"));
        }
        order
    }

    fn session(privileges: &[Privilege], member: Option<i64>) -> Session {
        Session {
            token: Default::default(),
            username: "staff".into(),
            expires: now() + Duration::hours(3),
            member: member.map(MemberId),
            privileges: privileges.iter().copied().collect::<Privileges>(),
        }
    }

    #[test]
    fn accepts_public_card_order() {
        let v = validator().validate(public_order(2, 2500), &catalog(), None).unwrap();
        let order = v.order();
        assert_eq!(order.created, Some(now()));
        assert_eq!(order.payments[0].created, Some(now()));
        assert_eq!(order.total(), Cents::from(5000));
        assert_eq!(v.products().len(), 1);
    }

    #[test]
    fn rejects_wrong_price() {
        let err = validator().validate(public_order(2, 2000), &catalog(), None).unwrap_err();
        assert!(matches!(err, Rejection::BadRequest(ref r) if r.starts_with("invalid products or prices")));
    }

    #[test]
    fn coupon_is_confirmed_or_cleared() {
        let mut order = public_order(1, 2000);
        order.coupon = Some("friends".into());
        let v = validator().validate(order, &catalog(), None).unwrap();
        assert_eq!(v.order().coupon.as_deref(), Some("friends"));
        let mut order = public_order(1, 2500);
        order.coupon = Some("BOGUS".into());
        let v = validator().validate(order, &catalog(), None).unwrap();
        assert!(v.order().coupon.is_none());
    }

    #[test]
    fn source_permissions() {
        let products = catalog();
        let mut order = public_order(1, 2500);
        order.member = Some(MemberId(4));
        assert_eq!(validator().validate(order, &products, None).unwrap_err(), Rejection::Forbidden);

        let mut order = public_order(1, 3000);
        order.source = OrderSource::InPerson;
        assert_eq!(validator().validate(order.clone(), &products, None).unwrap_err(), Rejection::Forbidden);
        let seller = session(&[Privilege::Sell], None);
        order.payments = vec![Payment::new(PaymentType::CardPresent, Cents::from(3000))];
        assert!(validator().validate(order, &products, Some(&seller)).is_ok());

        let mut order = public_order(1, 2500);
        order.source = OrderSource::Gala;
        let admin = session(&Privilege::ALL, None);
        assert_eq!(validator().validate(order, &products, Some(&admin)).unwrap_err(), Rejection::Forbidden);
    }

    #[test]
    fn office_order_defaults_member_from_session() {
        let mut order = public_order(1, 2500);
        order.source = OrderSource::Office;
        order.payments = vec![Payment::new(PaymentType::Check, Cents::from(2500)).with_method("check #1001")];
        let clerk = session(&[Privilege::HandleOrders], Some(12));
        let v = validator().validate(order.clone(), &catalog(), Some(&clerk)).unwrap();
        assert_eq!(v.order().member, Some(MemberId(12)));
        // Office check payments need a description
        order.payments[0].method = None;
        let err = validator().validate(order, &catalog(), Some(&clerk)).unwrap_err();
        assert_eq!(err, Rejection::bad_request("invalid payment"));
    }

    #[test]
    fn members_order_requires_matching_session() {
        let mut order = Order::new(OrderSource::Members);
        order.name = Some("Alto Two".into());
        order.email = Some("alto@example.org".into());
        order.lines.push(OrderLine::new("recording".into(), 1, Cents::from(0)));
        order.member = Some(MemberId(9));
        let singer = session(&[], Some(8));
        assert_eq!(validator().validate(order.clone(), &catalog(), Some(&singer)).unwrap_err(), Rejection::Forbidden);
        order.member = None;
        let v = validator().validate(order, &catalog(), Some(&singer)).unwrap();
        assert_eq!(v.order().member, Some(MemberId(8)));
        assert!(v.order().payments.is_empty());
    }

    #[test]
    fn structural_checks() {
        let products = catalog();
        let mut order = public_order(1, 2500);
        order.token = Some("1234-5678-9012".into());
        assert!(validator().validate(order, &products, None).is_err());

        let mut order = public_order(1, 2500);
        order.lines.push(OrderLine::new("adult".into(), -1, Cents::from(2500)));
        assert!(validator().validate(order, &products, None).is_err());

        // Zero-quantity lines are dropped
        let mut order = public_order(1, 2500);
        order.lines.push(OrderLine::new("adult".into(), 0, Cents::from(2500)));
        let v = validator().validate(order, &products, None).unwrap();
        assert_eq!(v.order().lines.len(), 1);

        let order = public_order(0, 2500);
        assert!(validator().validate(order, &products, None).is_err());

        let mut order = public_order(1, 2500);
        order.office_note = Some("VIP".into());
        assert!(validator().validate(order, &products, None).is_err());
    }

    #[test]
    fn back_entered_usage_must_name_a_bound_event() {
        let clerk = session(&[Privilege::HandleOrders], None);
        let mut order = public_order(2, 2500);
        order.source = OrderSource::Office;
        order.lines[0].used = 2;
        order.lines[0].used_at = Some("spring".into());
        assert!(validator().validate(order.clone(), &catalog(), Some(&clerk)).is_ok());
        order.lines[0].used = 3;
        assert!(validator().validate(order.clone(), &catalog(), Some(&clerk)).is_err());
        order.lines[0].used = 1;
        order.lines[0].used_at = Some("fall".into());
        assert!(validator().validate(order, &catalog(), Some(&clerk)).is_err());
    }

    #[test]
    fn customer_checks() {
        let products = catalog();
        let mut order = public_order(1, 2500);
        order.email = Some("not-an-email".into());
        assert_eq!(
            validator().validate(order, &products, None).unwrap_err(),
            Rejection::bad_request("invalid customer data: email")
        );
        let mut order = public_order(1, 2500);
        order.city = Some("Palo Alto".into());
        assert!(validator().validate(order.clone(), &products, None).is_err());
        order.address = Some("1 Main St".into());
        order.state = Some("CA".into());
        order.zip = Some("94301".into());
        assert!(validator().validate(order, &products, None).is_ok());

        // A lone donation needs an address
        let mut order = public_order(1, 2500);
        order.lines = vec![OrderLine::new("donation".into(), 1, Cents::from(5000))];
        order.payments[0].amount = Cents::from(5000);
        assert!(validator().validate(order, &products, None).is_err());

        let mut order = public_order(1, 2500);
        order.customer = Some("cus_abc".into());
        assert!(validator().validate(order, &products, None).is_err());
    }

    #[test]
    fn zero_total_payments() {
        let products = catalog();
        let mut order = Order::new(OrderSource::Members);
        order.name = Some("Tenor".into());
        order.email = Some("tenor@example.org".into());
        order.lines.push(OrderLine::new("recording".into(), 1, Cents::from(0)));
        let singer = session(&[], Some(3));
        order.payments.push(Payment::new(PaymentType::Cash, Cents::from(0)));
        let v = validator().validate(order.clone(), &products, Some(&singer)).unwrap();
        assert!(v.order().payments.is_empty());
        order.payments = vec![Payment::new(PaymentType::Card, Cents::from(0)).with_method("pm_1")];
        assert!(validator().validate(order, &products, Some(&singer)).is_err());
    }

    #[test]
    fn payment_shapes_by_source() {
        let products = catalog();
        let mut order = public_order(1, 2500);
        order.payments[0].method = Some("tok_abc".into());
        assert!(validator().validate(order, &products, None).is_err());
        let mut order = public_order(1, 2500);
        order.payments[0].amount = Cents::from(2400);
        assert!(validator().validate(order, &products, None).is_err());
        let mut order = public_order(1, 2500);
        order.payments[0].reference = Some("ch_1".into());
        assert!(validator().validate(order, &products, None).is_err());

        let seller = session(&[Privilege::Sell], None);
        let in_person = |payment: Payment| {
            let mut order = Order::new(OrderSource::InPerson);
            order.lines.push(OrderLine::new("adult".into(), 1, Cents::from(3000)));
            order.payments.push(payment);
            order
        };
        let amount = Cents::from(3000);
        let ok = [
            Payment::new(PaymentType::Card, amount).with_method("tok_visa"),
            Payment::new(PaymentType::Card, amount).with_method("pm_abc"),
            Payment::new(PaymentType::CardPresent, amount),
            Payment::new(PaymentType::Cash, amount),
            Payment::new(PaymentType::Check, amount),
        ];
        for p in ok {
            assert!(validator().validate(in_person(p), &products, Some(&seller)).is_ok());
        }
        let bad = [
            Payment::new(PaymentType::CardPresent, amount).with_method("pm_abc"),
            Payment::new(PaymentType::Cash, amount).with_method("twenties"),
            Payment::new(PaymentType::Other, amount),
        ];
        for p in bad {
            assert!(validator().validate(in_person(p), &products, Some(&seller)).is_err());
        }
    }
}

//! A small catalog for a spring concert, with a flexible season pass that also covers the fall concert.
use box_office_common::{Cents, Secret};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;

use crate::{
    db_types::{
        Event,
        MemberId,
        Order,
        OrderLine,
        OrderSource,
        Payment,
        PaymentType,
        PriceRule,
        Privilege,
        Privileges,
        Product,
        ProductEvent,
        ProductType,
        Session,
    },
    traits::CatalogManagement,
};

pub const SPRING: &str = "spring-2024";
pub const FALL: &str = "fall-2024";
pub const ADULT: &str = "adult-spring";
pub const CHILD: &str = "child-spring";
pub const SEASON_PASS: &str = "season-pass";
pub const DONATION: &str = "donation";

/// The moment every fixture is built around: ten days before the spring concert.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn spring_concert() -> Event {
    Event {
        id: SPRING.into(),
        name: "Spring Concert".into(),
        start: Utc.with_ymd_and_hms(2024, 5, 11, 19, 30, 0).unwrap(),
        capacity: 100,
    }
}

pub fn fall_concert() -> Event {
    Event {
        id: FALL.into(),
        name: "Fall Concert".into(),
        start: Utc.with_ymd_and_hms(2024, 10, 19, 19, 30, 0).unwrap(),
        capacity: 0,
    }
}

pub fn adult_ticket() -> Product {
    Product {
        id: ADULT.into(),
        name: "Spring Concert: Adult".into(),
        short_name: "Adult".into(),
        product_type: ProductType::Ticket,
        ticket_count: 1,
        ticket_class: "Adult".into(),
        events: vec![ProductEvent { event: spring_concert(), priority: 0 }],
        rules: vec![
            PriceRule::new(OrderSource::Public, Cents::from(2500)),
            PriceRule::new(OrderSource::Public, Cents::from(2000)).with_coupon("FRIENDS"),
            PriceRule::new(OrderSource::Members, Cents::from(2000)).members_only(),
            PriceRule::new(OrderSource::Office, Cents::from(2500)),
            PriceRule::new(OrderSource::InPerson, Cents::from(3000)),
        ],
        ..Default::default()
    }
}

/// Children get in for free at the door.
pub fn child_ticket() -> Product {
    Product {
        id: CHILD.into(),
        name: "Spring Concert: Child".into(),
        short_name: "Child".into(),
        product_type: ProductType::Ticket,
        ticket_count: 1,
        ticket_class: "Child".into(),
        events: vec![ProductEvent { event: spring_concert(), priority: 0 }],
        rules: vec![PriceRule::new(OrderSource::InPerson, Cents::from(0))],
        ..Default::default()
    }
}

/// Two adult admissions, good at either concert.
pub fn season_pass() -> Product {
    Product {
        id: SEASON_PASS.into(),
        name: "Season Pass".into(),
        product_type: ProductType::Ticket,
        ticket_count: 2,
        ticket_class: "Adult".into(),
        events: vec![
            ProductEvent { event: spring_concert(), priority: 1 },
            ProductEvent { event: fall_concert(), priority: 2 },
        ],
        rules: vec![
            PriceRule::new(OrderSource::Public, Cents::from(4500)),
            PriceRule::new(OrderSource::InPerson, Cents::from(5000)),
        ],
        ..Default::default()
    }
}

pub fn donation() -> Product {
    Product { id: DONATION.into(), name: "Donation".into(), product_type: ProductType::Donation, ..Default::default() }
}

/// Stores both events and every fixture product.
pub async fn seed_catalog<B: CatalogManagement>(db: &B) {
    for event in [spring_concert(), fall_concert()] {
        db.insert_event(&event).await.expect("Error inserting event");
    }
    for product in [adult_ticket(), child_ticket(), season_pass(), donation()] {
        db.insert_product(&product).await.expect("Error inserting product");
    }
    debug!("🚀️ Catalog seeded");
}

pub fn session(privileges: &[Privilege], member: Option<i64>) -> Session {
    Session {
        token: Secret::new("fixture-session".to_string()),
        username: "staff".into(),
        expires: now() + Duration::hours(3),
        member: member.map(MemberId),
        privileges: privileges.iter().copied().collect::<Privileges>(),
    }
}

pub fn door_staff() -> Session {
    session(&[Privilege::Sell, Privilege::Admit], None)
}

pub fn setup_staff() -> Session {
    session(&[Privilege::Setup], None)
}

/// An online order for `quantity` adult tickets, paid by card.
pub fn public_order(quantity: i32) -> Order {
    let mut order = Order::new(OrderSource::Public);
    order.name = Some("Jane Doe".into());
    order.email = Some("jane@example.org".into());
    order.lines.push(OrderLine::new(ADULT.into(), quantity, Cents::from(2500)));
    let total = order.total();
    order.payments.push(Payment::new(PaymentType::Card, total).with_method("pm_card_visa"));
    order
}

/// An anonymous door sale of `quantity` adult tickets.
pub fn door_order(quantity: i32, payment_type: PaymentType) -> Order {
    let mut order = Order::new(OrderSource::InPerson);
    order.lines.push(OrderLine::new(ADULT.into(), quantity, Cents::from(3000)));
    let total = order.total();
    let payment = Payment::new(payment_type, total);
    order.payments.push(match payment_type {
        PaymentType::Card => payment.with_method("tok_visa"),
        _ => payment,
    });
    order
}

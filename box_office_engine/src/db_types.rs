use std::{collections::HashMap, fmt::Display, str::FromStr};

pub use box_office_common::Cents;
use box_office_common::Secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------     Identifiers      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct EventId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MemberId(pub i64);

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "member {}", self.0)
    }
}

//--------------------------------------     OrderSource      ---------------------------------------------------------
/// The channel an order originated from. Price rules are scoped to a single source, and each source has its own
/// authorization requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    #[default]
    Public,
    Members,
    Gala,
    Office,
    #[serde(rename = "inperson")]
    InPerson,
}

impl Display for OrderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSource::Public => write!(f, "public"),
            OrderSource::Members => write!(f, "members"),
            OrderSource::Gala => write!(f, "gala"),
            OrderSource::Office => write!(f, "office"),
            OrderSource::InPerson => write!(f, "inperson"),
        }
    }
}

impl FromStr for OrderSource {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "members" => Ok(Self::Members),
            "gala" => Ok(Self::Gala),
            "office" => Ok(Self::Office),
            "inperson" => Ok(Self::InPerson),
            s => Err(ConversionError(format!("order source {s}"))),
        }
    }
}

//--------------------------------------     ProductType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Ticket,
    Donation,
    Recording,
    #[serde(rename = "sheetmusic")]
    SheetMusic,
    #[serde(rename = "auctionitem")]
    AuctionItem,
    Wardrobe,
    Registration,
    #[default]
    Other,
}

impl ProductType {
    /// Products whose lines must always have a quantity of exactly one.
    pub fn is_single_unit(&self) -> bool {
        matches!(self, Self::Donation | Self::Recording | Self::SheetMusic | Self::Registration)
    }

    /// Products whose price is set by the buyer rather than by a price rule.
    pub fn has_buyer_price(&self) -> bool {
        matches!(self, Self::Donation | Self::AuctionItem)
    }
}

impl Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductType::Ticket => "ticket",
            ProductType::Donation => "donation",
            ProductType::Recording => "recording",
            ProductType::SheetMusic => "sheetmusic",
            ProductType::AuctionItem => "auctionitem",
            ProductType::Wardrobe => "wardrobe",
            ProductType::Registration => "registration",
            ProductType::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ProductType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ticket" => Ok(Self::Ticket),
            "donation" => Ok(Self::Donation),
            "recording" => Ok(Self::Recording),
            "sheetmusic" => Ok(Self::SheetMusic),
            "auctionitem" => Ok(Self::AuctionItem),
            "wardrobe" => Ok(Self::Wardrobe),
            "registration" => Ok(Self::Registration),
            "other" => Ok(Self::Other),
            s => Err(ConversionError(format!("product type {s}"))),
        }
    }
}

//--------------------------------------     PaymentType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    #[default]
    Card,
    CardPresent,
    Cash,
    Check,
    Other,
}

impl PaymentType {
    /// Payment types that settle outside the payment gateway.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Cash | Self::Check | Self::Other)
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentType::Card => "card",
            PaymentType::CardPresent => "card-present",
            PaymentType::Cash => "cash",
            PaymentType::Check => "check",
            PaymentType::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "card-present" => Ok(Self::CardPresent),
            "cash" => Ok(Self::Cash),
            "check" => Ok(Self::Check),
            "other" => Ok(Self::Other),
            s => Err(ConversionError(format!("payment type {s}"))),
        }
    }
}

//--------------------------------------      Privileges      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Privilege {
    /// Catalog administration: events, products and price rules.
    Setup,
    Analyze,
    /// Office order handling. Also lifts sales-window restrictions on price rules.
    HandleOrders,
    /// At-the-door sales and payment capture.
    Sell,
    /// Door scanning.
    Admit,
}

impl Privilege {
    pub const ALL: [Privilege; 5] =
        [Privilege::Setup, Privilege::Analyze, Privilege::HandleOrders, Privilege::Sell, Privilege::Admit];

    fn bit(self) -> u8 {
        match self {
            Privilege::Setup => 0x01,
            Privilege::Analyze => 0x02,
            Privilege::HandleOrders => 0x04,
            Privilege::Sell => 0x08,
            Privilege::Admit => 0x10,
        }
    }
}

/// A set of [`Privilege`]s held by a session, stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Privileges(u8);

impl Privileges {
    pub fn from_bits(bits: u8) -> Self {
        let mask = Privilege::ALL.iter().fold(0, |acc, p| acc | p.bit());
        Self(bits & mask)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn with(mut self, privilege: Privilege) -> Self {
        self.0 |= privilege.bit();
        self
    }

    pub fn contains(&self, privilege: Privilege) -> bool {
        self.0 & privilege.bit() != 0
    }

    /// True if at least one of the given privileges is held.
    pub fn any(&self, privileges: &[Privilege]) -> bool {
        privileges.iter().any(|p| self.contains(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Privilege> + '_ {
        Privilege::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

impl FromIterator<Privilege> for Privileges {
    fn from_iter<T: IntoIterator<Item = Privilege>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Privileges::with)
    }
}

impl Serialize for Privileges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Privileges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Privilege>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

//--------------------------------------        Event         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start: DateTime<Utc>,
    /// Maximum number of tickets that may be issued for the event. Zero means unlimited.
    #[serde(default)]
    pub capacity: u32,
}

//--------------------------------------    ProductEvent      ---------------------------------------------------------
/// Binds a product to an event. Priority 0 marks a dedicated binding; any other value denotes a flexible pass, with
/// lower numbers consumed first at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEvent {
    pub event: Event,
    pub priority: i32,
}

impl ProductEvent {
    pub fn is_dedicated(&self) -> bool {
        self.priority == 0
    }
}

//--------------------------------------      PriceRule       ---------------------------------------------------------
/// A time-boxed price for a product, scoped to an order source, an optional coupon and optionally to members only.
/// The sales window is `[sales_start, sales_end)`; a missing bound is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source: OrderSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(default)]
    pub members_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_end: Option<DateTime<Utc>>,
    pub price: Cents,
}

impl PriceRule {
    pub fn new(source: OrderSource, price: Cents) -> Self {
        Self { source, price, ..Default::default() }
    }

    pub fn with_coupon<S: Into<String>>(mut self, coupon: S) -> Self {
        self.coupon = Some(coupon.into());
        self
    }

    pub fn members_only(mut self) -> Self {
        self.members_only = true;
        self
    }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.sales_start = start;
        self.sales_end = end;
        self
    }

    pub fn has_coupon(&self) -> bool {
        self.coupon.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// A free rule: zero price, no coupon and open to everyone. The sales window is not considered.
    pub fn is_free_admission(&self) -> bool {
        self.price.is_zero() && !self.has_coupon() && !self.members_only
    }

    /// Two rules are in the same bucket if they share source, coupon (case-insensitive) and the members-only flag.
    pub fn same_bucket(&self, other: &PriceRule) -> bool {
        let coupon = |r: &PriceRule| r.coupon.as_deref().unwrap_or_default().to_lowercase();
        self.source == other.source && self.members_only == other.members_only && coupon(self) == coupon(other)
    }

    pub fn overlaps(&self, other: &PriceRule) -> bool {
        let starts_before_other_ends = match (self.sales_start, other.sales_end) {
            (Some(s), Some(e)) => s < e,
            _ => true,
        };
        let ends_after_other_starts = match (self.sales_end, other.sales_start) {
            (Some(e), Some(s)) => e > s,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }
}

//--------------------------------------       Product        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    /// Tickets issued per unit purchased. Zero for non-ticket products.
    #[serde(default)]
    pub ticket_count: u32,
    /// Door-admission bucket label.
    #[serde(default)]
    pub ticket_class: String,
    #[serde(default)]
    pub events: Vec<ProductEvent>,
    #[serde(default)]
    pub rules: Vec<PriceRule>,
}

impl Product {
    pub fn issues_tickets(&self) -> bool {
        self.ticket_count > 0
    }

    pub fn binding_for(&self, event: &EventId) -> Option<&ProductEvent> {
        self.events.iter().find(|pe| &pe.event.id == event)
    }

    pub fn dedicated_event(&self) -> Option<&Event> {
        self.events.iter().find(|pe| pe.is_dedicated()).map(|pe| &pe.event)
    }

    pub fn free_admission_rule(&self) -> Option<&PriceRule> {
        self.rules.iter().find(|r| r.is_free_admission())
    }

    /// The receipt text, falling back to the product name.
    pub fn receipt_label(&self) -> &str {
        self.receipt.as_deref().filter(|r| !r.trim().is_empty()).unwrap_or(&self.name)
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// The products referenced by an order, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProductSet {
    products: HashMap<ProductId, Product>,
}

impl ProductSet {
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl From<Vec<Product>> for ProductSet {
    fn from(products: Vec<Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self { products }
    }
}

//--------------------------------------     EventBinding     ---------------------------------------------------------
/// The event a ticket belongs to. Flexible passes stay `Unbound` until they are consumed at a door.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<EventId>", into = "Option<EventId>")]
pub enum EventBinding {
    #[default]
    Unbound,
    BoundTo(EventId),
}

impl EventBinding {
    pub fn event(&self) -> Option<&EventId> {
        match self {
            EventBinding::Unbound => None,
            EventBinding::BoundTo(id) => Some(id),
        }
    }
}

impl From<Option<EventId>> for EventBinding {
    fn from(value: Option<EventId>) -> Self {
        value.map(EventBinding::BoundTo).unwrap_or(EventBinding::Unbound)
    }
}

impl From<EventBinding> for Option<EventId> {
    fn from(value: EventBinding) -> Self {
        match value {
            EventBinding::Unbound => None,
            EventBinding::BoundTo(id) => Some(id),
        }
    }
}

//--------------------------------------        Ticket        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub event: EventBinding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<DateTime<Utc>>,
    /// The door-scan session that consumed this ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<String>,
}

impl Ticket {
    pub fn new(event: EventBinding) -> Self {
        Self { event, ..Default::default() }
    }

    pub fn is_used(&self) -> bool {
        self.used.is_some()
    }
}

//--------------------------------------      OrderLine       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub product: ProductId,
    pub quantity: i32,
    pub price: Cents,
    /// Number of tickets on this line already used when the order is entered (back-entry of historical sales).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub used: i32,
    /// The event at which the back-entered tickets were used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<EventId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<Ticket>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

impl OrderLine {
    pub fn new(product: ProductId, quantity: i32, price: Cents) -> Self {
        Self { product, quantity, price, ..Default::default() }
    }

    pub fn total(&self) -> Cents {
        self.price * i64::from(self.quantity)
    }

    pub fn tickets_used(&self) -> usize {
        self.tickets.iter().filter(|t| t.is_used()).count()
    }
}

//--------------------------------------       Payment        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Card token or payment method reference on the way in, a human-readable description once settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Opaque gateway reference (charge or payment intent id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub amount: Cents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(payment_type: PaymentType, amount: Cents) -> Self {
        Self { payment_type, amount, ..Default::default() }
    }

    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = Some(method.into());
        self
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
/// A purchase transaction. The same type is used for caller-supplied drafts and for persisted orders; the validator
/// rejects drafts that carry system-assigned fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub source: OrderSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Gateway customer reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub revision: i64,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Order {
    pub fn new(source: OrderSource) -> Self {
        Self { source, ..Default::default() }
    }

    pub fn total(&self) -> Cents {
        self.lines.iter().map(OrderLine::total).sum()
    }

    pub fn has_tickets(&self) -> bool {
        self.lines.iter().any(|l| !l.tickets.is_empty())
    }

    pub fn ticket_count(&self) -> usize {
        self.lines.iter().map(|l| l.tickets.len()).sum()
    }

    /// The single payment attached to the order, if there is exactly one.
    pub fn sole_payment(&self) -> Option<&Payment> {
        match self.payments.as_slice() {
            [p] => Some(p),
            _ => None,
        }
    }
}

//--------------------------------------       Session        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: Secret<String>,
    pub username: String,
    pub expires: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberId>,
    pub privileges: Privileges,
}

impl Session {
    pub fn has(&self, privilege: Privilege) -> bool {
        self.privileges.contains(privilege)
    }

    /// Members-only price rules are open to anyone signed in as a member or holding any privilege.
    pub fn is_member_capable(&self) -> bool {
        self.member.is_some() || !self.privileges.is_empty()
    }
}

//--------------------------------------      CardHolder      ---------------------------------------------------------
/// The identity last seen paying with a given card, keyed by the gateway's card fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardHolder {
    pub card: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn enum_round_trips() {
        for s in ["public", "members", "gala", "office", "inperson"] {
            assert_eq!(OrderSource::from_str(s).unwrap().to_string(), s);
        }
        assert_eq!(PaymentType::from_str("card-present").unwrap(), PaymentType::CardPresent);
        assert!(ProductType::from_str("raffle").is_err());
        let json = serde_json::to_string(&PaymentType::CardPresent).unwrap();
        assert_eq!(json, "\"card-present\"");
        let json = serde_json::to_string(&OrderSource::InPerson).unwrap();
        assert_eq!(json, "\"inperson\"");
    }

    #[test]
    fn privileges_bitmask() {
        let p: Privileges = [Privilege::Sell, Privilege::Admit].into_iter().collect();
        assert!(p.contains(Privilege::Sell));
        assert!(!p.contains(Privilege::Setup));
        assert!(p.any(&[Privilege::Setup, Privilege::Admit]));
        assert_eq!(Privileges::from_bits(p.bits()), p);
        assert_eq!(Privileges::from_bits(0xff).iter().count(), 5);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"["Sell","Admit"]"#);
        let back: Privileges = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn event_binding_serializes_as_nullable_id() {
        let t = Ticket::new(EventBinding::Unbound);
        assert_eq!(serde_json::to_string(&t).unwrap(), r#"{"event":null}"#);
        let t = Ticket::new(EventBinding::BoundTo("2024-spring".into()));
        assert_eq!(serde_json::to_string(&t).unwrap(), r#"{"event":"2024-spring"}"#);
        let t: Ticket = serde_json::from_str(r#"{"event":"x"}"#).unwrap();
        assert_eq!(t.event.event(), Some(&EventId::from("x")));
    }

    #[test]
    fn rule_overlap() {
        let t = |h| Some(Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap());
        let a = PriceRule::new(OrderSource::Public, Cents::from(500)).with_window(t(10), t(12));
        let b = PriceRule::new(OrderSource::Public, Cents::from(400)).with_window(t(12), t(14));
        let c = PriceRule::new(OrderSource::Public, Cents::from(400)).with_window(t(11), None);
        let d = PriceRule::new(OrderSource::Public, Cents::from(400));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(d.overlaps(&a));
        assert!(a.same_bucket(&b));
        assert!(!a.same_bucket(&b.clone().with_coupon("SAVE")));
        assert!(a.clone().with_coupon("save").same_bucket(&b.with_coupon("SAVE")));
    }

    #[test]
    fn order_totals() {
        let mut order = Order::new(OrderSource::Public);
        order.lines.push(OrderLine::new("adult".into(), 2, Cents::from(2500)));
        order.lines.push(OrderLine::new("donation".into(), 1, Cents::from(1000)));
        assert_eq!(order.total(), Cents::from(6000));
        assert!(order.sole_payment().is_none());
        order.payments.push(Payment::new(PaymentType::Card, Cents::from(6000)));
        assert!(order.sole_payment().is_some());
    }
}

use std::{cmp::Ordering, fmt::Debug};

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use crate::{
    db_types::{
        Cents,
        Event,
        EventId,
        OrderId,
        OrderSource,
        PriceRule,
        Privilege,
        Product,
        ProductId,
        ProductType,
        Session,
    },
    helpers::SharedClock,
    pricing::{PriceResolver, PurchaseContext},
    traits::TicketingDatabase,
    usage::FreeClasses,
};

pub const SOLD_OUT_MESSAGE: &str = "This event is sold out.";

/// One product on a price list. `price` is only given when the product can be bought right now; otherwise `message`
/// says why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListEntry {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Cents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    /// False when a coupon was given and no listed price honours it.
    pub coupon: bool,
    pub products: Vec<PriceListEntry>,
    /// Set when nothing on the list is for sale, to be shown in place of the purchase form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A door-sales price for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPrice {
    pub id: ProductId,
    pub name: String,
    pub price: Cents,
    pub ticket_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedEvent {
    pub id: EventId,
    pub name: String,
    pub start: DateTime<Utc>,
    /// Ticket classes admitted to the event for free.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub free_entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WillCallEntry {
    pub id: OrderId,
    /// The buyer's name, last name first.
    pub name: String,
}

/// `CatalogApi` manages events, products and price rules, and answers the price and will-call queries of the
/// sales forms and door apps.
pub struct CatalogApi<B> {
    db: B,
    resolver: PriceResolver,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, clock: SharedClock) -> Self {
        Self { db, resolver: PriceResolver::new(clock) }
    }
}

impl<B> CatalogApi<B>
where B: TicketingDatabase
{
    pub async fn create_event(&self, event: Event, caller: Option<&Session>) -> Result<Event, CatalogError> {
        require(caller, Privilege::Setup)?;
        if event.id.0.trim().is_empty() || event.name.trim().is_empty() {
            return Err(CatalogError::Invalid("event id and name are required".into()));
        }
        self.db.insert_event(&event).await?;
        info!("🏷️ Event {} ({}) created", event.id, event.name);
        Ok(event)
    }

    /// Creates a product. Event bindings only need the event id; the stored event details are filled in.
    pub async fn create_product(
        &self,
        mut product: Product,
        caller: Option<&Session>,
    ) -> Result<Product, CatalogError> {
        require(caller, Privilege::Setup)?;
        if product.id.0.trim().is_empty() || product.name.trim().is_empty() {
            return Err(CatalogError::Invalid("product id and name are required".into()));
        }
        if product.events.iter().filter(|pe| pe.is_dedicated()).count() > 1 {
            return Err(CatalogError::Invalid("a product can be dedicated to one event at most".into()));
        }
        if product.product_type == ProductType::Ticket
            && (product.ticket_count == 0 || product.ticket_class.trim().is_empty())
        {
            return Err(CatalogError::Invalid("ticket products need a ticket count and a ticket class".into()));
        }
        for binding in product.events.iter_mut() {
            let id = binding.event.id.clone();
            binding.event = self.db.fetch_event(&id).await?.ok_or(CatalogError::EventNotFound(id))?;
        }
        let mut accepted: Vec<PriceRule> = Vec::with_capacity(product.rules.len());
        for rule in &product.rules {
            check_rule(rule, &accepted)?;
            accepted.push(rule.clone());
        }
        self.db.insert_product(&product).await?;
        info!("🏷️ Product {} created with {} price rule(s)", product.id, product.rules.len());
        let stored = self.db.fetch_product(&product.id).await?;
        stored.ok_or(CatalogError::ProductNotFound(product.id))
    }

    pub async fn add_price_rule(
        &self,
        product: &ProductId,
        rule: PriceRule,
        caller: Option<&Session>,
    ) -> Result<PriceRule, CatalogError> {
        require(caller, Privilege::Setup)?;
        let existing =
            self.db.fetch_product(product).await?.ok_or_else(|| CatalogError::ProductNotFound(product.clone()))?;
        check_rule(&rule, &existing.rules)?;
        let rule = self.db.insert_price_rule(product, &rule).await?;
        info!("🏷️ {} price of {} added to {product}", rule.source, rule.price);
        Ok(rule)
    }

    /// Prices for an online sales form. Unknown products, and products with no rule for the source, are left out.
    pub async fn price_list(
        &self,
        ids: &[ProductId],
        source: OrderSource,
        coupon: Option<&str>,
        caller: Option<&Session>,
    ) -> Result<PriceList, CatalogError> {
        match source {
            OrderSource::Public => {},
            OrderSource::Members if caller.is_some() => {},
            OrderSource::Members => return Err(CatalogError::Forbidden),
            _ => return Err(CatalogError::Invalid("invalid source".into())),
        }
        let coupon = coupon.filter(|c| !c.is_empty());
        let mut ctx = PurchaseContext::new(source).with_coupon(coupon);
        ctx.member_capable = caller.is_some_and(Session::is_member_capable);
        let mut coupon_matched = coupon.is_none();
        let mut products = Vec::with_capacity(ids.len());
        let mut first_message = None;
        for id in ids {
            let Some(product) = self.db.fetch_product(id).await? else {
                continue;
            };
            let preview = self.resolver.preview(&product.rules, &ctx);
            let Some(rule) = preview.rule() else {
                continue;
            };
            if rule.has_coupon() {
                coupon_matched = true;
            }
            let name = display_name(&product);
            let mut entry = PriceListEntry { id: product.id.clone(), name, price: None, message: None };
            if !self.has_capacity(&product).await? {
                entry.message = Some(SOLD_OUT_MESSAGE.to_string());
            } else if let Some(message) = preview.message() {
                first_message.get_or_insert_with(|| message.clone());
                entry.message = Some(message);
            } else {
                entry.price = Some(rule.price);
            }
            products.push(entry);
        }
        let nothing_on_sale = products.iter().all(|p| p.price.is_none());
        let message = if nothing_on_sale { first_message } else { None };
        trace!("🏷️ Price list for {} product(s): {} listed", ids.len(), products.len());
        Ok(PriceList { coupon: coupon_matched, products, message })
    }

    /// Door-sales prices for an event. Products dedicated to another event are left out, as are sold-out ones.
    pub async fn event_prices(
        &self,
        event: &EventId,
        caller: Option<&Session>,
    ) -> Result<Vec<EventPrice>, CatalogError> {
        require(caller, Privilege::Sell)?;
        self.db.fetch_event(event).await?.ok_or_else(|| CatalogError::EventNotFound(event.clone()))?;
        let ctx = PurchaseContext::new(OrderSource::InPerson);
        let mut prices = Vec::new();
        for product in self.db.fetch_products_for_event(event).await? {
            let dedicated_elsewhere = product.dedicated_event().is_some_and(|e| &e.id != event);
            if dedicated_elsewhere || !self.has_capacity(&product).await? {
                continue;
            }
            if let Some(rule) = self.resolver.resolve(&product.rules, &ctx) {
                prices.push(EventPrice {
                    id: product.id.clone(),
                    name: display_name(&product),
                    price: rule.price,
                    ticket_count: product.ticket_count,
                });
            }
        }
        Ok(prices)
    }

    /// Events from the start of today onwards, with the ticket classes that get in for free.
    pub async fn list_events(&self, caller: Option<&Session>) -> Result<Vec<ListedEvent>, CatalogError> {
        let allowed = caller.is_some_and(|s| s.privileges.any(&[Privilege::Setup, Privilege::Sell, Privilege::Admit]));
        if !allowed {
            return Err(CatalogError::Forbidden);
        }
        let now = self.resolver.now();
        let today = now.date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc()).unwrap_or(now - Duration::hours(24));
        let mut listed = Vec::new();
        for event in self.db.fetch_events_after(today).await? {
            let free = FreeClasses::for_event(&event.id, self.db.fetch_products_for_event(&event.id).await?);
            let free_entries = free.classes().cloned().collect();
            listed.push(ListedEvent { id: event.id, name: event.name, start: event.start, free_entries });
        }
        Ok(listed)
    }

    /// Valid orders with tickets for the event, sorted by the buyer's last name.
    pub async fn will_call(
        &self,
        event: &EventId,
        caller: Option<&Session>,
    ) -> Result<Vec<WillCallEntry>, CatalogError> {
        require(caller, Privilege::Sell)?;
        self.db.fetch_event(event).await?.ok_or_else(|| CatalogError::EventNotFound(event.clone()))?;
        let mut list = self
            .db
            .fetch_orders_for_event(event)
            .await?
            .into_iter()
            .filter_map(|o| {
                let id = o.id?;
                Some(WillCallEntry { id, name: last_name_first(o.name.as_deref().unwrap_or_default()) })
            })
            .collect::<Vec<_>>();
        list.sort_by(|a, b| match a.name.cmp(&b.name) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        Ok(list)
    }

    /// A product has capacity unless its dedicated event has a limit that has been reached.
    async fn has_capacity(&self, product: &Product) -> Result<bool, CatalogError> {
        let Some(event) = product.dedicated_event().filter(|e| e.capacity > 0) else {
            return Ok(true);
        };
        let issued = self.db.tickets_issued_for_event(&event.id).await?;
        Ok(issued < event.capacity)
    }
}

fn require(caller: Option<&Session>, privilege: Privilege) -> Result<(), CatalogError> {
    match caller {
        Some(session) if session.has(privilege) => Ok(()),
        _ => Err(CatalogError::Forbidden),
    }
}

fn display_name(product: &Product) -> String {
    if product.short_name.is_empty() {
        product.name.clone()
    } else {
        product.short_name.clone()
    }
}

/// The window must not be empty, and must not overlap another rule in the same bucket.
fn check_rule(rule: &PriceRule, existing: &[PriceRule]) -> Result<(), CatalogError> {
    if let (Some(start), Some(end)) = (rule.sales_start, rule.sales_end) {
        if end <= start {
            return Err(CatalogError::Invalid("sales end must be after sales start".into()));
        }
    }
    if rule.price.value() < 0 {
        return Err(CatalogError::Invalid("price cannot be negative".into()));
    }
    if existing.iter().any(|r| r.same_bucket(rule) && r.overlaps(rule)) {
        return Err(CatalogError::Invalid("price rule overlaps an existing rule".into()));
    }
    Ok(())
}

/// "Jane Q. Doe, Jr." becomes "Doe, Jane Q., Jr."
pub fn last_name_first(name: &str) -> String {
    let name = name.trim();
    let (name, suffix) = match name.rsplit_once(',') {
        Some((n, s)) => (n.trim(), s.trim()),
        None => (name, ""),
    };
    let reordered = match name.rsplit_once(' ') {
        Some((first, last)) => format!("{last}, {first}"),
        None => name.to_string(),
    };
    if suffix.is_empty() {
        reordered
    } else {
        format!("{reordered}, {suffix}")
    }
}

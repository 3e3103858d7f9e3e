use box_office_engine::db_types::{Event, EventId, PriceRule, Product, ProductEvent, ProductId, ProductType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product as the setup app submits it. Events are named by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub ticket_count: u32,
    #[serde(default)]
    pub ticket_class: String,
    #[serde(default)]
    pub events: Vec<NewProductEvent>,
    #[serde(default)]
    pub rules: Vec<PriceRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductEvent {
    pub event: EventId,
    #[serde(default)]
    pub priority: i32,
}

impl From<NewProduct> for Product {
    fn from(value: NewProduct) -> Self {
        // The catalog fills in the stored event details
        let events = value
            .events
            .into_iter()
            .map(|pe| ProductEvent {
                event: Event { id: pe.event, name: String::new(), start: DateTime::<Utc>::default(), capacity: 0 },
                priority: pe.priority,
            })
            .collect();
        Product {
            id: value.id,
            name: value.name,
            short_name: value.short_name,
            product_type: value.product_type,
            receipt: value.receipt,
            ticket_count: value.ticket_count,
            ticket_class: value.ticket_class,
            events,
            rules: value.rules,
        }
    }
}

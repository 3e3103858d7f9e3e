use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, ProductId, ProductSet};

/// An order became valid: it was paid, or needed no payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderValidEvent {
    pub order: Order,
    /// A receipt should be emailed. Card-present sales skip the receipt unless asked for one.
    pub send_receipt: bool,
    /// How each product on the order is worded on the receipt.
    #[serde(default)]
    pub receipt_labels: BTreeMap<ProductId, String>,
}

impl OrderValidEvent {
    pub fn new(order: Order) -> Self {
        let send_receipt = order.email.is_some();
        Self { order, send_receipt, receipt_labels: BTreeMap::new() }
    }

    pub fn with_products(mut self, products: &ProductSet) -> Self {
        self.receipt_labels = self
            .order
            .lines
            .iter()
            .filter_map(|line| products.get(&line.product))
            .map(|p| (p.id.clone(), p.receipt_label().to_string()))
            .collect();
        self
    }
}

/// A pending card-present order was cancelled and deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceledEvent {
    pub order: Order,
}

impl OrderCanceledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

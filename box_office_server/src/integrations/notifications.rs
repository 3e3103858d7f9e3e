use std::{collections::BTreeMap, fmt::Write};

use box_office_engine::{
    db_types::{Cents, Order, OrderId, OrderSource, ProductId},
    events::{EventHandlers, EventHooks, OrderCanceledEvent, OrderValidEvent},
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::*;
use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

/// One row of the sales spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub id: OrderId,
    pub source: OrderSource,
    pub name: Option<String>,
    pub email: Option<String>,
    pub total: Cents,
    pub tickets: usize,
    pub created: Option<DateTime<Utc>>,
}

impl SheetRow {
    pub fn from_order(order: &Order) -> Option<Self> {
        Some(Self {
            id: order.id?,
            source: order.source,
            name: order.name.clone(),
            email: order.email.clone(),
            total: order.total(),
            tickets: order.ticket_count(),
            created: order.created,
        })
    }
}

/// Assigns the notification hooks.
///
/// 1. OrderValidEvent - the buyer is sent a receipt when the order carries an email address, and the order is posted
///    to the sales sheet when a sync URL is configured.
/// 2. OrderCanceledEvent - only logged. A cancelled order never reached the sheet.
pub fn create_notification_event_handlers(config: &NotificationConfig, buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let client = reqwest::Client::new();
    let sheet_sync_url = config.sheet_sync_url.clone();
    let receipt_from = config.receipt_from.clone();
    // --- On OrderValid Handler ---
    hooks.on_order_valid(move |ev| {
        let OrderValidEvent { order, send_receipt, receipt_labels } = ev;
        if send_receipt {
            send_receipt_for(&order, &receipt_labels, &receipt_from);
        }
        let Some(url) = sheet_sync_url.clone() else {
            return no_op();
        };
        let Some(row) = SheetRow::from_order(&order) else {
            warn!("📬️ A valid order without an id cannot be synced to the sales sheet");
            return no_op();
        };
        let client = client.clone();
        Box::pin(async move {
            match client.post(&url).json(&row).send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => debug!("📬️ Order {} synced to the sales sheet", row.id),
                Err(e) => error!("📬️ Could not sync order {} to the sales sheet. {e}", row.id),
            }
        })
    });
    // --- On OrderCanceled Handler ---
    hooks.on_order_canceled(|ev| {
        let OrderCanceledEvent { order } = ev;
        info!("📬️ Pending order {:?} for {} was cancelled", order.id, order.total());
        no_op()
    });
    EventHandlers::new(buffer_size, hooks)
}

// Delivery is left to the mail relay watching the log
fn send_receipt_for(order: &Order, labels: &BTreeMap<ProductId, String>, from: &str) {
    let Some(to) = order.email.as_deref() else {
        return;
    };
    let id = order.id.map(|id| id.to_string()).unwrap_or_default();
    info!("📬️ Receipt for order {id} from <{from}> to <{to}>\n{}", receipt_text(order, labels));
}

/// A plain text receipt, one line per order line followed by the payment. Products missing from `labels` are shown
/// by id.
pub fn receipt_text(order: &Order, labels: &BTreeMap<ProductId, String>) -> String {
    let mut text = String::new();
    if let Some(name) = &order.name {
        let _ = writeln!(text, "Dear {name},\n");
    }
    let _ = writeln!(text, "Thank you for your order.\n");
    for line in &order.lines {
        let product = labels.get(&line.product).cloned().unwrap_or_else(|| line.product.to_string());
        let total = line.total().to_string();
        let _ = writeln!(text, "{:>3} × {product:<30} {total:>10}", line.quantity);
    }
    let _ = writeln!(text, "{:>46}", format!("Total {}", order.total()));
    for payment in &order.payments {
        let method = payment.method.as_deref().unwrap_or_default();
        let _ = writeln!(text, "Paid {} by {} {method}", payment.amount, payment.payment_type);
    }
    if order.has_tickets() {
        if let Some(token) = &order.token {
            let _ = writeln!(text, "\nYour tickets: {token}. Bring this number, or your name, to the door.");
        }
    }
    text
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}

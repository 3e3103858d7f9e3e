use std::collections::BTreeMap;

use crate::db_types::{EventId, Order, Product, ProductSet};

/// Order line indices grouped by ticket class. Each list is in the priority order of the lines' bindings to the event.
pub type ClassMap = BTreeMap<String, Vec<usize>>;

/// Builds the class map of `order` for `event`.
///
/// Returns `None` if the order holds no ticket lines at all. An empty map means the order has ticket lines, but none
/// of them are good for this event.
pub fn class_map(order: &Order, products: &ProductSet, event: &EventId) -> Option<ClassMap> {
    let mut has_tickets = false;
    let mut prioritised = BTreeMap::<String, Vec<(i32, usize)>>::new();
    for (idx, line) in order.lines.iter().enumerate() {
        let Some(product) = products.get(&line.product).filter(|p| p.issues_tickets()) else {
            continue;
        };
        has_tickets = true;
        if let Some(binding) = product.binding_for(event) {
            prioritised.entry(product.ticket_class.clone()).or_default().push((binding.priority, idx));
        }
    }
    if !has_tickets {
        return None;
    }
    let map = prioritised
        .into_iter()
        .map(|(class, mut lines)| {
            // stable, so equal priorities keep line order
            lines.sort_by_key(|(priority, _)| *priority);
            (class, lines.into_iter().map(|(_, idx)| idx).collect())
        })
        .collect();
    Some(map)
}

/// Ticket classes an event admits for free, with the product that issues the free tickets.
#[derive(Debug, Clone, Default)]
pub struct FreeClasses {
    classes: BTreeMap<String, Product>,
}

impl FreeClasses {
    /// Picks out the products bound to `event` that carry a free-admission rule. Sales windows are not considered.
    pub fn for_event<I: IntoIterator<Item = Product>>(event: &EventId, products: I) -> Self {
        let classes = products
            .into_iter()
            .filter(|p| p.issues_tickets() && p.binding_for(event).is_some() && p.free_admission_rule().is_some())
            .map(|p| (p.ticket_class.clone(), p))
            .collect();
        Self { classes }
    }

    pub fn get(&self, class: &str) -> Option<&Product> {
        self.classes.get(class)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &String> {
        self.classes.keys()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.classes.values()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

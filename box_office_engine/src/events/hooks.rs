use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderCanceledEvent, OrderValidEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_valid_producer: Vec<EventProducer<OrderValidEvent>>,
    pub order_canceled_producer: Vec<EventProducer<OrderCanceledEvent>>,
}

impl EventProducers {
    pub async fn publish_order_valid(&self, event: OrderValidEvent) {
        for producer in &self.order_valid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_canceled(&self, event: OrderCanceledEvent) {
        for producer in &self.order_canceled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_valid: Option<EventHandler<OrderValidEvent>>,
    pub on_order_canceled: Option<EventHandler<OrderCanceledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_valid = hooks.on_order_valid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_canceled = hooks.on_order_canceled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_valid, on_order_canceled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_valid {
            result.order_valid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_canceled {
            result.order_canceled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler onto the runtime.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_valid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_canceled {
            tokio::spawn(handler.start_handler());
        }
    }
}

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_valid: Option<Handler<OrderValidEvent>>,
    pub on_order_canceled: Option<Handler<OrderCanceledEvent>>,
}

impl EventHooks {
    pub fn on_order_valid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderValidEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_valid = Some(Arc::new(f));
        self
    }

    pub fn on_order_canceled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCanceledEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_canceled = Some(Arc::new(f));
        self
    }
}

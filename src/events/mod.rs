//! Best-effort domain events emitted after commit.
//!
//! Events are advisory: a send failure is logged and never fails the
//! request that produced it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i64,
        order_no: String,
    },
    OrderStatusChanged {
        order_id: i64,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCompleted {
        order_id: i64,
    },
    OrderCancelled {
        order_id: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }
}

/// Consumes events until every sender is dropped. Currently a structured
/// log sink; downstream consumers (notifications, reporting) hang off here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated { order_id, order_no } => {
                info!(order_id, %order_no, "event: order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id, %old_status, %new_status, "event: order status changed");
            }
            Event::OrderCompleted { order_id } => {
                info!(order_id, "event: order completed");
            }
            Event::OrderCancelled { order_id } => {
                info!(order_id, "event: order cancelled");
            }
        }
    }
    warn!("event channel closed, processor exiting");
}

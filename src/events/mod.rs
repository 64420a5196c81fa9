use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::RowKey;

/// Severity used when presenting a notification to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// User-visible outcomes of the inventory workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ProductsLoaded { count: usize },
    WarehousesLoaded { count: usize },
    LoadFailed { resource: String, message: String },
    WarehouseChosen { warehouse_id: String },
    RowsAdded { count: usize },
    StockLookupDegraded { product_id: String, reason: String },
    RowRemoved { key: RowKey },
    ValidationFailed { message: String },
    BatchFailed { message: String },
    Submitted { warehouse_id: String, item_count: usize },
    SubmissionFailed { message: String },
    StockInSubmitted { warehouse_id: String, item_count: usize },
}

impl Event {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Event::LoadFailed { .. }
            | Event::BatchFailed { .. }
            | Event::SubmissionFailed { .. } => NoticeLevel::Error,
            Event::StockLookupDegraded { .. } | Event::ValidationFailed { .. } => {
                NoticeLevel::Warning
            }
            _ => NoticeLevel::Success,
        }
    }

    /// Toast text for the event.
    pub fn message(&self) -> String {
        match self {
            Event::ProductsLoaded { count } => format!("Loaded {} product(s)", count),
            Event::WarehousesLoaded { count } => format!("Loaded {} warehouse(s)", count),
            Event::LoadFailed { resource, message } => {
                format!("Failed to load {}: {}", resource, message)
            }
            Event::WarehouseChosen { warehouse_id } => {
                format!("Counting warehouse {}", warehouse_id)
            }
            Event::RowsAdded { count } => format!("Added {} product(s)", count),
            Event::StockLookupDegraded { product_id, reason } => format!(
                "Could not read stock for product {} ({}); assuming 0",
                product_id, reason
            ),
            Event::RowRemoved { .. } => "Item removed".to_string(),
            Event::ValidationFailed { message }
            | Event::BatchFailed { message }
            | Event::SubmissionFailed { message } => message.clone(),
            Event::Submitted { item_count, .. } => {
                format!("Inventory check created with {} item(s)", item_count)
            }
            Event::StockInSubmitted { item_count, .. } => {
                format!("Stock-in receipt created with {} item(s)", item_count)
            }
        }
    }
}

/// An event stamped with the moment it was raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub event: Event,
    pub level: NoticeLevel,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(event: Event) -> Self {
        Self {
            level: event.level(),
            event,
            emitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Notification>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(Notification::new(event))
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Deliver `event` if anyone is listening.
///
/// The listener going away (the screen was closed) is not an error for the
/// workflow, so a failed send is only logged.
pub async fn notify(sender: Option<&EventSender>, event: Event) {
    if let Some(sender) = sender {
        if let Err(err) = sender.send(event).await {
            debug!(error = %err, "Dropping notification; no listener");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_carry_level_and_message() {
        let (sender, mut rx) = EventSender::channel(4);
        sender.send(Event::RowsAdded { count: 2 }).await.unwrap();

        let notice = rx.recv().await.expect("notification");
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.event.message(), "Added 2 product(s)");
    }

    #[tokio::test]
    async fn notify_tolerates_closed_channel() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);

        assert!(sender.send(Event::RowsAdded { count: 1 }).await.is_err());
        notify(Some(&sender), Event::RowsAdded { count: 1 }).await;
        notify(None, Event::RowsAdded { count: 1 }).await;
    }

    #[test]
    fn failures_are_error_level() {
        let event = Event::SubmissionFailed {
            message: "Warehouse is locked".into(),
        };
        assert_eq!(event.level(), NoticeLevel::Error);
        assert_eq!(event.message(), "Warehouse is locked");
        assert_eq!(NoticeLevel::Warning.to_string(), "warning");
    }
}

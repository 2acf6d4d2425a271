//! Notification events and the delivery seam.

use crate::ids::NotificationId;
use crate::order::Order;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The order reached Delivered.
    OrderDelivered,
    /// Tracking details were sent to the customer.
    ShipmentDispatched,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderDelivered => "order_delivered",
            NotificationKind::ShipmentDispatched => "shipment_dispatched",
        }
    }

    /// Email subject line for this kind.
    pub fn subject(&self, order: &Order) -> String {
        match self {
            NotificationKind::OrderDelivered => {
                format!("Your order {} has been delivered", order.id)
            }
            NotificationKind::ShipmentDispatched => {
                format!("Your order {} is on its way", order.id)
            }
        }
    }
}

/// A queued customer notification with the order as it was when enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub recipient: String,
    pub order: Order,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub enqueued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, recipient: impl Into<String>, order: Order) -> Self {
        Self {
            id: NotificationId::generate(),
            kind,
            recipient: recipient.into(),
            order,
            enqueued_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> String {
        self.kind.subject(&self.order)
    }
}

/// Errors returned by a [`Notifier`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Provider unreachable or timed out.
    #[error("notification provider unavailable: {0}")]
    Unavailable(String),

    /// Provider refused the message.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

impl NotifyError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Unavailable(_))
    }
}

/// Delivers notifications to customers (email provider, SMS gateway, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only logs. Used when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            notification_id = %notification.id,
            kind = notification.kind.as_str(),
            order_id = %notification.order.id,
            recipient = %notification.recipient,
            subject = %notification.subject(),
            "notification sent"
        );
        Ok(())
    }
}

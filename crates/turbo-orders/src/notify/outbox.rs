//! Notification outbox.
//!
//! Writers enqueue through an [`Outbox`] handle and return immediately; a
//! [`Dispatcher`] owns the receiving end and delivers with retries. A failed
//! delivery is logged and counted but never reaches the writer.

use crate::error::CommerceError;
use crate::ids::NotificationId;
use crate::notify::event::{Notification, Notifier};
use crate::notify::retry::RetryPolicy;
use serde::Serialize;
use tokio::sync::mpsc;

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Outbox {
    /// Create a queue and the dispatcher that drains it.
    pub fn channel(policy: RetryPolicy) -> (Outbox, Dispatcher) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Outbox { tx }, Dispatcher { rx, policy })
    }

    /// Queue a notification. A closed queue is logged, not returned.
    pub fn enqueue(&self, notification: Notification) -> NotificationId {
        let id = notification.id.clone();
        let kind = notification.kind.as_str();
        let order_id = notification.order.id.clone();

        match self.tx.send(notification) {
            Ok(()) => {
                tracing::debug!(notification_id = %id, kind, order_id = %order_id, "notification queued");
            }
            Err(_) => {
                tracing::error!(
                    notification_id = %id,
                    kind,
                    order_id = %order_id,
                    "notification dropped: dispatcher is gone"
                );
            }
        }
        id
    }
}

/// Outcome counts for a dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Receiving half of the notification queue.
#[derive(Debug)]
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Notification>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Deliver until every [`Outbox`] handle has been dropped.
    pub async fn run(mut self, notifier: &dyn Notifier) -> DispatchReport {
        let mut report = DispatchReport::default();
        while let Some(notification) = self.rx.recv().await {
            self.dispatch(notifier, &notification, &mut report).await;
        }
        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            "notification dispatcher stopped"
        );
        report
    }

    /// Deliver whatever is queued right now, then return.
    pub async fn drain(&mut self, notifier: &dyn Notifier) -> DispatchReport {
        let mut report = DispatchReport::default();
        while let Ok(notification) = self.rx.try_recv() {
            self.dispatch(notifier, &notification, &mut report).await;
        }
        report
    }

    async fn dispatch(
        &self,
        notifier: &dyn Notifier,
        notification: &Notification,
        report: &mut DispatchReport,
    ) {
        let result = self
            .policy
            .run(|attempt| {
                tracing::debug!(
                    notification_id = %notification.id,
                    attempt,
                    "sending notification"
                );
                notifier.send(notification)
            })
            .await;

        match result {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                let err = CommerceError::ExternalService(format!(
                    "{} notification {} for order {}: {}",
                    notification.kind.as_str(),
                    notification.id,
                    notification.order.id,
                    e
                ));
                tracing::error!(
                    notification_id = %notification.id,
                    order_id = %notification.order.id,
                    error = %err,
                    "notification delivery failed"
                );
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::notify::event::{NotificationKind, NotifyError};
    use crate::notify::retry::BackoffStrategy;
    use crate::order::{NewOrder, Order, OrderLineItem, PaymentMethod, ShippingAddress};
    use crate::pricing::PriceBreakdown;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn order() -> Order {
        let new = NewOrder {
            items: vec![OrderLineItem::new("p1", "Shawl", Money::new(1000), 1)],
            pricing: PriceBreakdown {
                subtotal: Money::new(1000),
                shipping_cost: Money::new(200),
                tax: Money::zero(),
                discount: Money::zero(),
                total: Money::new(1200),
                subscriber_savings: Money::zero(),
            },
            coupon_code: None,
            shipping_address: ShippingAddress::new("Hina", "2 Mall Rd", "Lahore", "", "0301"),
            payment_method: PaymentMethod::Card,
            customer: None,
            abandoned_cart_id: None,
        };
        Order::place(new, Utc::now())
    }

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<NotificationId>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.id.clone());
            Ok(())
        }
    }

    struct Flaky {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(NotifyError::Unavailable("smtp timeout".into()));
            }
            Ok(())
        }
    }

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts).with_backoff(BackoffStrategy::None)
    }

    #[tokio::test]
    async fn test_drain_delivers_queued() {
        let (outbox, mut dispatcher) = Outbox::channel(quick_policy(1));
        let id = outbox.enqueue(Notification::new(
            NotificationKind::OrderDelivered,
            "a@example.com",
            order(),
        ));

        let notifier = Recording::default();
        let report = dispatcher.drain(&notifier).await;

        assert_eq!(report, DispatchReport { delivered: 1, failed: 0 });
        assert_eq!(*notifier.sent.lock().unwrap(), vec![id]);

        let again = dispatcher.drain(&notifier).await;
        assert_eq!(again.total(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let (outbox, mut dispatcher) = Outbox::channel(quick_policy(3));
        outbox.enqueue(Notification::new(
            NotificationKind::ShipmentDispatched,
            "a@example.com",
            order(),
        ));

        let notifier = Flaky {
            failures_left: AtomicU32::new(2),
        };
        let report = dispatcher.drain(&notifier).await;
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_counted_as_failed() {
        let (outbox, mut dispatcher) = Outbox::channel(quick_policy(2));
        outbox.enqueue(Notification::new(
            NotificationKind::OrderDelivered,
            "a@example.com",
            order(),
        ));

        let notifier = Flaky {
            failures_left: AtomicU32::new(5),
        };
        let report = dispatcher.drain(&notifier).await;
        assert_eq!(report, DispatchReport { delivered: 0, failed: 1 });
    }

    #[tokio::test]
    async fn test_run_stops_when_outbox_dropped() {
        let (outbox, dispatcher) = Outbox::channel(quick_policy(1));
        outbox.enqueue(Notification::new(
            NotificationKind::OrderDelivered,
            "a@example.com",
            order(),
        ));
        drop(outbox);

        let notifier = Recording::default();
        let report = dispatcher.run(&notifier).await;
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn test_enqueue_on_closed_queue_does_not_panic() {
        let (outbox, dispatcher) = Outbox::channel(quick_policy(1));
        drop(dispatcher);
        outbox.enqueue(Notification::new(
            NotificationKind::OrderDelivered,
            "a@example.com",
            order(),
        ));
    }
}

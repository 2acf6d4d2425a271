//! Order lifecycle manager.

use crate::error::CommerceError;
use crate::ids::{NotificationId, OrderId};
use crate::notify::{Notification, NotificationKind, Outbox};
use crate::order::address::non_blank;
use crate::order::model::{NewOrder, Order, OrderStatus};
use crate::repository::OrderRepository;
use chrono::Utc;
use std::sync::Arc;

/// Creates orders and applies status, payment and tracking updates.
///
/// Updates are last-write-wins: there is no version check between the read
/// and the write.
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
    outbox: Outbox,
}

impl OrderLifecycle {
    pub fn new(orders: Arc<dyn OrderRepository>, outbox: Outbox) -> Self {
        Self { orders, outbox }
    }

    /// Validate and persist a new order as Pending and unpaid.
    pub async fn create(&self, new: NewOrder) -> Result<OrderId, CommerceError> {
        self.place(new).await.map(|order| order.id)
    }

    /// Like [`create`](Self::create), returning the stored order.
    pub async fn place(&self, new: NewOrder) -> Result<Order, CommerceError> {
        new.validate()?;
        let order = Order::place(new, Utc::now());
        self.orders.insert(&order).await?;
        tracing::info!(
            order_id = %order.id,
            total = order.total_amount.amount(),
            items = order.items.len(),
            "order created"
        );
        Ok(order)
    }

    pub async fn get(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::order_not_found(id.as_str()))
    }

    /// Write a new status. Entering Delivered queues one delivery notice.
    pub async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let mut order = self.get(id).await?;
        let previous = order.status;

        order.status = status;
        order.updated_at = Utc::now();
        self.orders.save(&order).await?;
        tracing::info!(
            order_id = %id,
            from = previous.as_str(),
            status = status.as_str(),
            "order status updated"
        );

        if status == OrderStatus::Delivered && previous != OrderStatus::Delivered {
            match order.recipient_email() {
                Some(email) => {
                    self.outbox.enqueue(Notification::new(
                        NotificationKind::OrderDelivered,
                        email,
                        order.clone(),
                    ));
                }
                None => {
                    tracing::warn!(order_id = %id, "no recipient email; delivery notice skipped");
                }
            }
        }

        Ok(order)
    }

    /// Queue a shipment notice with the order's tracking details.
    pub async fn send_shipment_notice(&self, id: &OrderId) -> Result<NotificationId, CommerceError> {
        let order = self.get(id).await?;

        if order.tracking().is_none() {
            return Err(CommerceError::PreconditionFailed(format!(
                "order {} has no tracking id",
                id
            )));
        }
        let Some(email) = order.recipient_email().map(str::to_string) else {
            return Err(CommerceError::PreconditionFailed(format!(
                "order {} has no recipient email",
                id
            )));
        };

        let notification_id = self.outbox.enqueue(Notification::new(
            NotificationKind::ShipmentDispatched,
            email,
            order,
        ));
        tracing::info!(order_id = %id, notification_id = %notification_id, "shipment notice queued");
        Ok(notification_id)
    }

    /// Set the paid flag. Paying stamps `paid_at`; unpaying clears it.
    pub async fn set_paid(&self, id: &OrderId, paid: bool) -> Result<Order, CommerceError> {
        let mut order = self.get(id).await?;
        let now = Utc::now();
        order.is_paid = paid;
        order.paid_at = paid.then_some(now);
        order.updated_at = now;
        self.orders.save(&order).await?;
        tracing::info!(order_id = %id, paid, "order payment updated");
        Ok(order)
    }

    /// Record shipment tracking details.
    pub async fn set_tracking(
        &self,
        id: &OrderId,
        tracking_id: &str,
        courier: Option<&str>,
    ) -> Result<Order, CommerceError> {
        let Some(tracking_id) = non_blank(Some(tracking_id)) else {
            return Err(CommerceError::Validation("tracking id must not be blank".to_string()));
        };

        let mut order = self.get(id).await?;
        order.tracking_id = Some(tracking_id.to_string());
        order.courier_company = non_blank(courier).map(str::to_string);
        order.updated_at = Utc::now();
        self.orders.save(&order).await?;
        tracing::info!(order_id = %id, tracking_id, "order tracking updated");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::notify::{Dispatcher, Notifier, NotifyError, RetryPolicy};
    use crate::order::{OrderLineItem, PaymentMethod, ShippingAddress};
    use crate::pricing::PriceBreakdown;
    use crate::store::DocumentOrderRepository;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use turbo_store::DocumentStore;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(NotificationKind, String)>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((notification.kind, notification.recipient.clone()));
            Ok(())
        }
    }

    fn lifecycle() -> (OrderLifecycle, Dispatcher) {
        let repo = DocumentOrderRepository::new(Arc::new(DocumentStore::new()));
        let (outbox, dispatcher) = Outbox::channel(RetryPolicy::none());
        (OrderLifecycle::new(Arc::new(repo), outbox), dispatcher)
    }

    fn new_order(email: Option<&str>) -> NewOrder {
        let mut address = ShippingAddress::new("Amna", "7 Model Town", "Lahore", "54700", "0321");
        if let Some(email) = email {
            address = address.with_email(email);
        }
        NewOrder {
            items: vec![OrderLineItem::new("p1", "Chiffon Suit", Money::new(4800), 1)],
            pricing: PriceBreakdown {
                subtotal: Money::new(4800),
                shipping_cost: Money::new(200),
                tax: Money::zero(),
                discount: Money::zero(),
                total: Money::new(5000),
                subscriber_savings: Money::zero(),
            },
            coupon_code: None,
            shipping_address: address,
            payment_method: PaymentMethod::Cod,
            customer: None,
            abandoned_cart_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_persists_pending() {
        let (lifecycle, _dispatcher) = lifecycle();
        let id = lifecycle.create(new_order(None)).await.unwrap();
        let stored = lifecycle.get(&id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(!stored.is_paid);
        assert_eq!(stored.total_amount, Money::new(5000));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let (lifecycle, _dispatcher) = lifecycle();
        let mut new = new_order(None);
        new.items[0].quantity = 0;
        let err = lifecycle.create(new).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delivered_notifies_once() {
        let (lifecycle, mut dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(Some("amna@example.com"))).await.unwrap();

        lifecycle.set_status(&order.id, OrderStatus::Shipped).await.unwrap();
        lifecycle.set_status(&order.id, OrderStatus::Delivered).await.unwrap();
        lifecycle.set_status(&order.id, OrderStatus::Delivered).await.unwrap();

        let notifier = Recording::default();
        let report = dispatcher.drain(&notifier).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec![(NotificationKind::OrderDelivered, "amna@example.com".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delivered_without_email_still_writes() {
        let (lifecycle, mut dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(None)).await.unwrap();
        let updated = lifecycle.set_status(&order.id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);

        let report = dispatcher.drain(&Recording::default()).await;
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn test_status_writes_are_not_gated() {
        let (lifecycle, _dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(None)).await.unwrap();
        lifecycle.set_status(&order.id, OrderStatus::Delivered).await.unwrap();
        let back = lifecycle.set_status(&order.id, OrderStatus::Pending).await.unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_set_status_unknown_order() {
        let (lifecycle, _dispatcher) = lifecycle();
        let err = lifecycle
            .set_status(&OrderId::new("nope"), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_shipment_notice_requires_tracking_then_email() {
        let (lifecycle, mut dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(None)).await.unwrap();

        let err = lifecycle.send_shipment_notice(&order.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::PreconditionFailed(ref m) if m.contains("tracking")));

        lifecycle.set_tracking(&order.id, "TRK-1", Some("TCS")).await.unwrap();
        let err = lifecycle.send_shipment_notice(&order.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::PreconditionFailed(ref m) if m.contains("email")));

        let report = dispatcher.drain(&Recording::default()).await;
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn test_shipment_notice_independent_of_status() {
        let (lifecycle, mut dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(Some("amna@example.com"))).await.unwrap();
        lifecycle.set_tracking(&order.id, "TRK-9", None).await.unwrap();

        lifecycle.send_shipment_notice(&order.id).await.unwrap();

        let notifier = Recording::default();
        dispatcher.drain(&notifier).await;
        assert_eq!(
            notifier.sent.lock().unwrap()[0].0,
            NotificationKind::ShipmentDispatched
        );
    }

    #[tokio::test]
    async fn test_set_paid_stamps_and_clears() {
        let (lifecycle, _dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(None)).await.unwrap();

        let paid = lifecycle.set_paid(&order.id, true).await.unwrap();
        assert!(paid.is_paid);
        assert!(paid.paid_at.is_some());

        let unpaid = lifecycle.set_paid(&order.id, false).await.unwrap();
        assert!(!unpaid.is_paid);
        assert!(unpaid.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_blank_tracking_rejected() {
        let (lifecycle, _dispatcher) = lifecycle();
        let order = lifecycle.place(new_order(None)).await.unwrap();
        let err = lifecycle.set_tracking(&order.id, "  ", None).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }
}

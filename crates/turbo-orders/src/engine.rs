//! The order engine facade.

use crate::analytics::{AnalyticsAggregator, AnalyticsReport};
use crate::config::EngineConfig;
use crate::error::CommerceError;
use crate::ids::{AbandonedCartId, NotificationId, OrderId};
use crate::money::Money;
use crate::notify::{Dispatcher, Outbox};
use crate::order::{NewOrder, Order, OrderLifecycle, OrderStatus};
use crate::pricing::{compute_price, Coupon, PriceBreakdown, PricingLine};
use crate::recovery::{AbandonedCart, CartSnapshot, RecoveryStatus, RecoveryTracker};
use crate::repository::{CartRepository, OrderRepository};
use crate::store::{DocumentCartRepository, DocumentOrderRepository};
use chrono::Utc;
use std::sync::Arc;
use turbo_store::DocumentStore;

/// Entry point for storefront order operations.
///
/// Every operation is request-scoped; the repositories hold all state.
/// Notifications are queued to the [`Dispatcher`] returned by the
/// constructor, which the caller runs or drains.
#[derive(Clone)]
pub struct CommerceEngine {
    config: EngineConfig,
    lifecycle: OrderLifecycle,
    recovery: RecoveryTracker,
    analytics: AnalyticsAggregator,
}

impl CommerceEngine {
    pub fn new(
        config: EngineConfig,
        orders: Arc<dyn OrderRepository>,
        carts: Arc<dyn CartRepository>,
    ) -> (Self, Dispatcher) {
        let (outbox, dispatcher) = Outbox::channel(config.notifications.retry_policy());
        let engine = Self {
            lifecycle: OrderLifecycle::new(orders.clone(), outbox),
            recovery: RecoveryTracker::new(carts),
            analytics: AnalyticsAggregator::new(orders, config.analytics.clone()),
            config,
        };
        (engine, dispatcher)
    }

    /// Engine over a shared document store.
    pub fn with_store(config: EngineConfig, store: Arc<DocumentStore>) -> (Self, Dispatcher) {
        let orders = Arc::new(DocumentOrderRepository::new(store.clone()));
        let carts = Arc::new(DocumentCartRepository::new(store));
        Self::new(config, orders, carts)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute_price(
        &self,
        items: &[PricingLine],
        discount: Option<Money>,
    ) -> Result<PriceBreakdown, CommerceError> {
        compute_price(items, &self.config.shipping, &self.config.tax, discount)
    }

    /// Price a cart with a coupon's discount resolved against its subtotal.
    pub fn compute_price_with_coupon(
        &self,
        items: &[PricingLine],
        coupon: &Coupon,
    ) -> Result<PriceBreakdown, CommerceError> {
        let undiscounted = self.compute_price(items, None)?;
        let discount = coupon.discount_for(undiscounted.subtotal, Utc::now())?;
        self.compute_price(items, Some(discount))
    }

    /// Place an order. Its originating abandoned cart, if any, is marked
    /// recovered; failing to do so does not fail the order.
    #[tracing::instrument(skip_all, fields(items = new.items.len()))]
    pub async fn create_order(&self, new: NewOrder) -> Result<OrderId, CommerceError> {
        let order = self.lifecycle.place(new).await?;
        if let Err(e) = self.recovery.recover_from_order(&order).await {
            tracing::warn!(order_id = %order.id, error = %e, "could not mark cart recovered");
        }
        Ok(order.id)
    }

    #[tracing::instrument(skip_all, fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.lifecycle.get(id).await
    }

    #[tracing::instrument(skip_all, fields(order_id = %id, status = status.as_str()))]
    pub async fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        self.lifecycle.set_status(id, status).await
    }

    #[tracing::instrument(skip_all, fields(order_id = %id, paid = paid))]
    pub async fn set_order_paid(&self, id: &OrderId, paid: bool) -> Result<Order, CommerceError> {
        self.lifecycle.set_paid(id, paid).await
    }

    #[tracing::instrument(skip_all, fields(order_id = %id))]
    pub async fn set_order_tracking(
        &self,
        id: &OrderId,
        tracking_id: &str,
        courier: Option<&str>,
    ) -> Result<Order, CommerceError> {
        self.lifecycle.set_tracking(id, tracking_id, courier).await
    }

    #[tracing::instrument(skip_all, fields(order_id = %id))]
    pub async fn send_shipment_notice(&self, id: &OrderId) -> Result<NotificationId, CommerceError> {
        self.lifecycle.send_shipment_notice(id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_analytics(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<AnalyticsReport, CommerceError> {
        self.analytics.report(start, end).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn record_abandoned_cart(
        &self,
        snapshot: CartSnapshot,
    ) -> Result<AbandonedCartId, CommerceError> {
        self.recovery.record_snapshot(snapshot).await
    }

    #[tracing::instrument(skip_all, fields(cart_id = %id))]
    pub async fn mark_cart_sent(&self, id: &AbandonedCartId) -> Result<AbandonedCart, CommerceError> {
        self.recovery.mark_sent(id).await
    }

    #[tracing::instrument(skip_all, fields(cart_id = %id))]
    pub async fn mark_cart_clicked(
        &self,
        id: &AbandonedCartId,
    ) -> Result<AbandonedCart, CommerceError> {
        self.recovery.mark_clicked(id).await
    }

    #[tracing::instrument(skip_all, fields(cart_id = %id))]
    pub async fn mark_cart_recovered(
        &self,
        id: &AbandonedCartId,
    ) -> Result<AbandonedCart, CommerceError> {
        self.recovery.mark_recovered(id).await
    }

    pub async fn get_abandoned_cart(
        &self,
        id: &AbandonedCartId,
    ) -> Result<AbandonedCart, CommerceError> {
        self.recovery.get(id).await
    }

    pub async fn recent_abandoned_carts(
        &self,
        limit: usize,
    ) -> Result<Vec<(AbandonedCart, RecoveryStatus)>, CommerceError> {
        self.recovery.list_recent(limit).await
    }
}

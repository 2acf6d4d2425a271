//! Repositories backed by the document store.

use crate::analytics::DateWindow;
use crate::error::CommerceError;
use crate::ids::{AbandonedCartId, OrderId};
use crate::order::{Order, OrderStatus};
use crate::recovery::{AbandonedCart, CartKey};
use crate::repository::{CartRepository, OrderQuery, OrderRepository, StatusCounts};
use async_trait::async_trait;
use std::sync::Arc;
use turbo_store::{DocumentStore, Filter, Query, Sort};

/// Collection holding orders.
pub const ORDERS: &str = "orders";
/// Collection holding abandoned carts.
pub const ABANDONED_CARTS: &str = "abandoned_carts";

fn window_filter(filter: Filter, window: &DateWindow) -> Filter {
    let (start, end) = window.millis();
    filter.gte("created_at", start).lte("created_at", end)
}

/// Orders in a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct DocumentOrderRepository {
    store: Arc<DocumentStore>,
}

impl DocumentOrderRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    fn filter_for(query: &OrderQuery) -> Filter {
        let mut filter = Filter::new();
        if let Some(window) = &query.window {
            filter = window_filter(filter, window);
        }
        if !query.exclude_statuses.is_empty() {
            filter = filter.not_in("status", query.exclude_statuses.iter().map(|s| s.as_str()));
        }
        filter
    }
}

#[async_trait]
impl OrderRepository for DocumentOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), CommerceError> {
        self.store.insert(ORDERS, order.id.as_str(), order).await?;
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        Ok(self.store.get(ORDERS, id.as_str()).await?)
    }

    async fn save(&self, order: &Order) -> Result<(), CommerceError> {
        match self.store.replace(ORDERS, order.id.as_str(), order).await {
            Ok(()) => Ok(()),
            Err(turbo_store::StoreError::NotFound { .. }) => {
                Err(CommerceError::order_not_found(order.id.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, query: &OrderQuery) -> Result<Vec<Order>, CommerceError> {
        let mut store_query = Query::new(Self::filter_for(query));
        if query.newest_first {
            store_query = store_query.sort(Sort::desc("created_at"));
        }
        if let Some(limit) = query.limit {
            store_query = store_query.limit(limit);
        }
        Ok(self.store.find(ORDERS, &store_query).await?)
    }

    async fn count_by_status(&self, window: &DateWindow) -> Result<StatusCounts, CommerceError> {
        let mut counts = StatusCounts::default();
        for status in OrderStatus::ALL {
            let filter = window_filter(Filter::new(), window).eq("status", status.as_str());
            counts.set(status, self.store.count(ORDERS, &filter).await);
        }
        Ok(counts)
    }

    async fn count_by_customer_email(&self, email: &str) -> Result<u64, CommerceError> {
        // Imported dumps may hold untrimmed emails; match on the trimmed form.
        let email = email.trim();
        let query = Query::new(Filter::new().exists("shipping_address.email", true));
        let orders: Vec<Order> = self.store.find(ORDERS, &query).await?;
        let count = orders
            .iter()
            .filter(|o| o.shipping_address.contact_email() == Some(email))
            .count();
        Ok(count as u64)
    }
}

/// Abandoned carts in a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct DocumentCartRepository {
    store: Arc<DocumentStore>,
}

impl DocumentCartRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CartRepository for DocumentCartRepository {
    async fn find_by_key(&self, key: &CartKey) -> Result<Option<AbandonedCart>, CommerceError> {
        let filter = Filter::new().eq(key.field(), key.value());
        Ok(self.store.find_one(ABANDONED_CARTS, &filter).await?)
    }

    async fn get(&self, id: &AbandonedCartId) -> Result<Option<AbandonedCart>, CommerceError> {
        Ok(self.store.get(ABANDONED_CARTS, id.as_str()).await?)
    }

    async fn insert(&self, cart: &AbandonedCart) -> Result<(), CommerceError> {
        self.store.insert(ABANDONED_CARTS, cart.id.as_str(), cart).await?;
        Ok(())
    }

    async fn save(&self, cart: &AbandonedCart) -> Result<(), CommerceError> {
        match self.store.replace(ABANDONED_CARTS, cart.id.as_str(), cart).await {
            Ok(()) => Ok(()),
            Err(turbo_store::StoreError::NotFound { .. }) => {
                Err(CommerceError::cart_not_found(cart.id.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AbandonedCart>, CommerceError> {
        let query = Query::new(Filter::new())
            .sort(Sort::desc("updated_at"))
            .limit(limit);
        Ok(self.store.find(ABANDONED_CARTS, &query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::order::{NewOrder, OrderLineItem, PaymentMethod, ShippingAddress};
    use crate::pricing::PriceBreakdown;
    use chrono::{DateTime, Duration, Utc};

    fn order_at(created_at: DateTime<Utc>, status: OrderStatus, email: Option<&str>) -> Order {
        let mut address = ShippingAddress::new("Zara", "5 Gulberg", "Lahore", "", "0302");
        if let Some(email) = email {
            address = address.with_email(email);
        }
        let new = NewOrder {
            items: vec![OrderLineItem::new("p1", "Dupatta", Money::new(800), 1)],
            pricing: PriceBreakdown {
                subtotal: Money::new(800),
                shipping_cost: Money::new(200),
                tax: Money::zero(),
                discount: Money::zero(),
                total: Money::new(1000),
                subscriber_savings: Money::zero(),
            },
            coupon_code: None,
            shipping_address: address,
            payment_method: PaymentMethod::Cod,
            customer: None,
            abandoned_cart_id: None,
        };
        let mut order = Order::place(new, created_at);
        order.status = status;
        order
    }

    fn repo() -> DocumentOrderRepository {
        DocumentOrderRepository::new(Arc::new(DocumentStore::new()))
    }

    #[tokio::test]
    async fn test_save_unknown_order_is_not_found() {
        let repo = repo();
        let order = order_at(Utc::now(), OrderStatus::Pending, None);
        let err = repo.save(&order).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { kind: "Order", .. }));
    }

    #[tokio::test]
    async fn test_find_filters_window_and_status() {
        let repo = repo();
        let now = Utc::now();
        let inside = order_at(now - Duration::days(1), OrderStatus::Delivered, None);
        let cancelled = order_at(now - Duration::days(2), OrderStatus::Cancelled, None);
        let outside = order_at(now - Duration::days(40), OrderStatus::Delivered, None);
        for order in [&inside, &cancelled, &outside] {
            repo.insert(order).await.unwrap();
        }

        let window = DateWindow::trailing_days(now, 30).unwrap();
        let found = repo
            .find(&OrderQuery::new().within(window).sales_only())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, inside.id);

        let counts = repo.count_by_status(&window).await.unwrap();
        assert_eq!(counts.get(OrderStatus::Delivered), 1);
        assert_eq!(counts.get(OrderStatus::Cancelled), 1);
    }

    #[tokio::test]
    async fn test_find_newest_first_with_limit() {
        let repo = repo();
        let now = Utc::now();
        let old = order_at(now - Duration::hours(2), OrderStatus::Pending, None);
        let new = order_at(now - Duration::hours(1), OrderStatus::Pending, None);
        repo.insert(&old).await.unwrap();
        repo.insert(&new).await.unwrap();

        let found = repo.find(&OrderQuery::new().newest_first().limit(1)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, new.id);
    }

    #[tokio::test]
    async fn test_count_by_customer_email_is_all_time() {
        let repo = repo();
        let now = Utc::now();
        repo.insert(&order_at(now, OrderStatus::Delivered, Some("a@example.com")))
            .await
            .unwrap();
        repo.insert(&order_at(now - Duration::days(400), OrderStatus::Cancelled, Some("a@example.com")))
            .await
            .unwrap();
        repo.insert(&order_at(now, OrderStatus::Delivered, Some("b@example.com")))
            .await
            .unwrap();

        assert_eq!(repo.count_by_customer_email("a@example.com").await.unwrap(), 2);
        assert_eq!(repo.count_by_customer_email("c@example.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_by_customer_email_ignores_stored_whitespace() {
        let repo = repo();
        let now = Utc::now();
        for days in [1, 90] {
            let mut order = order_at(now - Duration::days(days), OrderStatus::Delivered, None);
            order.shipping_address.email = Some(" a@example.com ".to_string());
            repo.insert(&order).await.unwrap();
        }

        assert_eq!(repo.count_by_customer_email("a@example.com").await.unwrap(), 2);
    }
}

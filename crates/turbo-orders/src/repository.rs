//! Persistence seams for orders and abandoned carts.

use crate::analytics::DateWindow;
use crate::error::CommerceError;
use crate::ids::{AbandonedCartId, OrderId};
use crate::order::{Order, OrderStatus};
use crate::recovery::{AbandonedCart, CartKey};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

/// Selection of orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Only orders created within this window.
    pub window: Option<DateWindow>,
    /// Statuses to leave out.
    pub exclude_statuses: Vec<OrderStatus>,
    /// Newest first when set, otherwise storage order.
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn excluding(mut self, statuses: &[OrderStatus]) -> Self {
        self.exclude_statuses.extend_from_slice(statuses);
        self
    }

    /// Orders that count toward sales.
    pub fn sales_only(self) -> Self {
        self.excluding(&[OrderStatus::Cancelled, OrderStatus::Returned])
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Order counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts(HashMap<OrderStatus, u64>);

impl StatusCounts {
    pub fn get(&self, status: OrderStatus) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn set(&mut self, status: OrderStatus, count: u64) {
        self.0.insert(status, count);
    }

    /// Pending, Processing and Confirmed combined.
    pub fn pending_like(&self) -> u64 {
        OrderStatus::ALL
            .iter()
            .filter(|s| s.is_pending_like())
            .map(|s| self.get(*s))
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

impl FromIterator<(OrderStatus, u64)> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = (OrderStatus, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order.
    async fn insert(&self, order: &Order) -> Result<(), CommerceError>;

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, CommerceError>;

    /// Overwrite an existing order. Unknown ids are `NotFound`.
    async fn save(&self, order: &Order) -> Result<(), CommerceError>;

    async fn find(&self, query: &OrderQuery) -> Result<Vec<Order>, CommerceError>;

    /// Orders created within `window`, counted per status.
    async fn count_by_status(&self, window: &DateWindow) -> Result<StatusCounts, CommerceError>;

    /// All-time orders whose shipping email equals `email`.
    async fn count_by_customer_email(&self, email: &str) -> Result<u64, CommerceError>;
}

/// Abandoned cart persistence.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_key(&self, key: &CartKey) -> Result<Option<AbandonedCart>, CommerceError>;

    async fn get(&self, id: &AbandonedCartId) -> Result<Option<AbandonedCart>, CommerceError>;

    async fn insert(&self, cart: &AbandonedCart) -> Result<(), CommerceError>;

    /// Overwrite an existing cart. Unknown ids are `NotFound`.
    async fn save(&self, cart: &AbandonedCart) -> Result<(), CommerceError>;

    /// Carts by most recent activity, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<AbandonedCart>, CommerceError>;
}

//! Dashboard report types.

use crate::analytics::metrics::{MetricComparison, PeriodMetric};
use crate::analytics::window::ReportWindow;
use crate::ids::{OrderId, ProductId};
use crate::money::Money;
use crate::order::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Headline numbers, current window against previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadlineMetrics {
    pub total_sales: MetricComparison,
    pub order_count: MetricComparison,
    pub average_order_value: MetricComparison,
    /// Pending, Processing and Confirmed.
    pub pending_orders: MetricComparison,
    pub cancelled_orders: MetricComparison,
    pub returned_orders: MetricComparison,
}

/// One calendar day (UTC) of sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub sales: Money,
    pub orders: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub revenue: Money,
}

/// Share of recent customers with more than one order.
///
/// Only the first `sample_size` distinct customers are checked, so this is
/// an estimate when `sampled` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReturningCustomers {
    pub rate_percent: i64,
    pub sampled: bool,
    pub sample_size: usize,
    pub distinct_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentOrder {
    pub id: OrderId,
    pub customer_name: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub is_paid: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Everything the storefront dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    pub window: ReportWindow,
    pub current: PeriodMetric,
    pub previous: PeriodMetric,
    pub metrics: HeadlineMetrics,
    pub daily: Vec<DailyBucket>,
    pub top_products: Vec<TopProduct>,
    pub returning_customers: ReturningCustomers,
    pub recent_orders: Vec<RecentOrder>,
    pub generated_at: DateTime<Utc>,
}

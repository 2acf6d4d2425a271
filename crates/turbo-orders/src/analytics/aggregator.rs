//! Dashboard analytics over the order repository.

use crate::analytics::metrics::{MetricComparison, PeriodMetric};
use crate::analytics::report::{
    AnalyticsReport, DailyBucket, HeadlineMetrics, RecentOrder, ReturningCustomers, TopProduct,
};
use crate::analytics::window::{DateWindow, ReportWindow};
use crate::config::AnalyticsConfig;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use crate::order::{Order, OrderStatus};
use crate::repository::{OrderQuery, OrderRepository};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Builds [`AnalyticsReport`]s.
///
/// Sub-queries run concurrently and are not snapshot-consistent with each
/// other.
#[derive(Clone)]
pub struct AnalyticsAggregator {
    orders: Arc<dyn OrderRepository>,
    config: AnalyticsConfig,
}

impl AnalyticsAggregator {
    pub fn new(orders: Arc<dyn OrderRepository>, config: AnalyticsConfig) -> Self {
        Self { orders, config }
    }

    pub async fn report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<AnalyticsReport, CommerceError> {
        self.report_at(start, end, Utc::now()).await
    }

    /// Build a report as of `now`.
    pub async fn report_at(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, CommerceError> {
        let window = ReportWindow::resolve(start, end, now, self.config.default_window_days)?;

        let current_query = OrderQuery::new().within(window.current).sales_only();
        let previous_query = OrderQuery::new().within(window.previous).sales_only();
        let recent_query = OrderQuery::new()
            .within(window.current)
            .newest_first()
            .limit(self.config.recent_orders);

        let (current_orders, previous_orders, current_counts, previous_counts, recent) =
            futures::try_join!(
                self.orders.find(&current_query),
                self.orders.find(&previous_query),
                self.orders.count_by_status(&window.current),
                self.orders.count_by_status(&window.previous),
                self.orders.find(&recent_query),
            )
            .map_err(computation)?;

        let returning_customers = self
            .returning_customers(&current_orders)
            .await
            .map_err(computation)?;

        let current = PeriodMetric::from_orders(&current_orders)?;
        let previous = PeriodMetric::from_orders(&previous_orders)?;

        let metrics = HeadlineMetrics {
            total_sales: MetricComparison::money(current.sales, previous.sales),
            order_count: MetricComparison::counts(current.count, previous.count),
            average_order_value: MetricComparison::money(current.aov, previous.aov),
            pending_orders: MetricComparison::counts(
                current_counts.pending_like(),
                previous_counts.pending_like(),
            ),
            cancelled_orders: MetricComparison::counts(
                current_counts.get(OrderStatus::Cancelled),
                previous_counts.get(OrderStatus::Cancelled),
            ),
            returned_orders: MetricComparison::counts(
                current_counts.get(OrderStatus::Returned),
                previous_counts.get(OrderStatus::Returned),
            ),
        };

        let report = AnalyticsReport {
            window,
            current,
            previous,
            metrics,
            daily: daily_series(&window.current, &current_orders)?,
            top_products: top_products(&current_orders, self.config.top_products)?,
            returning_customers,
            recent_orders: recent.iter().map(recent_order).collect(),
            generated_at: now,
        };

        tracing::debug!(
            orders = report.current.count,
            sales = report.current.sales.amount(),
            days = report.daily.len(),
            "analytics report built"
        );
        Ok(report)
    }

    async fn returning_customers(
        &self,
        orders: &[Order],
    ) -> Result<ReturningCustomers, CommerceError> {
        let mut seen = HashSet::new();
        let emails: Vec<&str> = orders
            .iter()
            .filter_map(|o| o.shipping_address.contact_email())
            .filter(|email| seen.insert(*email))
            .collect();

        let sample: Vec<&str> = emails
            .iter()
            .copied()
            .take(self.config.returning_sample_cap)
            .collect();
        let counts = try_join_all(
            sample
                .iter()
                .map(|email| self.orders.count_by_customer_email(email)),
        )
        .await?;

        let returning = counts.iter().filter(|&&n| n > 1).count();
        let rate_percent = if sample.is_empty() {
            0
        } else {
            (returning as f64 / sample.len() as f64 * 100.0).round() as i64
        };

        Ok(ReturningCustomers {
            rate_percent,
            sampled: emails.len() > sample.len(),
            sample_size: sample.len(),
            distinct_customers: emails.len(),
        })
    }
}

fn computation(e: CommerceError) -> CommerceError {
    match e {
        CommerceError::Computation(_) => e,
        other => CommerceError::Computation(format!("analytics query failed: {}", other)),
    }
}

fn overflow(what: &str) -> CommerceError {
    CommerceError::Computation(format!("{} overflowed", what))
}

/// One zero-filled bucket per UTC day in the window.
fn daily_series(window: &DateWindow, orders: &[Order]) -> Result<Vec<DailyBucket>, CommerceError> {
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = window
        .days()
        .into_iter()
        .map(|date| {
            (
                date,
                DailyBucket {
                    date,
                    sales: Money::zero(),
                    orders: 0,
                },
            )
        })
        .collect();

    for order in orders {
        // Days past the cap have no bucket.
        if let Some(bucket) = buckets.get_mut(&order.created_at.date_naive()) {
            bucket.sales = bucket
                .sales
                .checked_add(order.total_amount)
                .ok_or_else(|| overflow("daily sales"))?;
            bucket.orders += 1;
        }
    }

    Ok(buckets.into_values().collect())
}

/// Best sellers by quantity, then revenue, then product id.
fn top_products(orders: &[Order], limit: usize) -> Result<Vec<TopProduct>, CommerceError> {
    let mut by_product: HashMap<&ProductId, TopProduct> = HashMap::new();

    for item in orders.iter().flat_map(|o| &o.items) {
        let revenue = item
            .unit_price
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| overflow("product revenue"))?;
        let entry = by_product
            .entry(&item.product_id)
            .or_insert_with(|| TopProduct {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                quantity: 0,
                revenue: Money::zero(),
            });
        entry.quantity += u64::from(item.quantity);
        entry.revenue = entry
            .revenue
            .checked_add(revenue)
            .ok_or_else(|| overflow("product revenue"))?;
    }

    let mut products: Vec<TopProduct> = by_product.into_values().collect();
    products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(limit);
    Ok(products)
}

fn recent_order(order: &Order) -> RecentOrder {
    RecentOrder {
        id: order.id.clone(),
        customer_name: order.customer_display_name(),
        total_amount: order.total_amount,
        status: order.status,
        is_paid: order.is_paid,
        created_at: order.created_at,
    }
}

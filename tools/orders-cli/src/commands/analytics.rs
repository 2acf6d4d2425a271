//! Analytics report command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use turbo_orders::analytics::{AnalyticsReport, MetricComparison};
use turbo_orders::order::Order;
use turbo_orders::store::ORDERS;
use turbo_orders::CommerceEngine;
use turbo_store::DocumentStore;

use super::AnalyticsArgs;
use crate::context::Context;
use crate::output::{format_change, order_status_badge};

/// Run the analytics command.
pub async fn run(args: AnalyticsArgs, ctx: &Context) -> Result<()> {
    let orders: Vec<Order> = ctx.read_json(&args.orders)?;

    let spinner = ctx.output.spinner(&format!("Loading {} orders...", orders.len()));
    let store = Arc::new(DocumentStore::new());
    let imported = store
        .import(ORDERS, orders.into_iter().map(|o| (o.id.to_string(), o)))
        .await
        .context("Failed to load orders dump")?;

    spinner.set_message("Computing report...");
    let (engine, _dispatcher) = CommerceEngine::with_store(ctx.config.clone(), store);
    let report = engine
        .get_analytics(args.start.as_deref(), args.end.as_deref())
        .await;
    spinner.finish_and_clear();
    let report = report?;

    tracing::debug!(imported, "analytics computed over orders dump");

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    print_report(ctx, &report);
    Ok(())
}

fn print_report(ctx: &Context, report: &AnalyticsReport) {
    let window = &report.window.current;
    ctx.output.header(&format!(
        "Analytics {} to {}",
        window.start.format("%Y-%m-%d %H:%M"),
        window.end.format("%Y-%m-%d %H:%M")
    ));

    let metrics = &report.metrics;
    let money = |m: &MetricComparison| turbo_orders::Money::new(m.current).display();
    let count = |m: &MetricComparison| m.current.to_string();
    let rows: [(&str, &MetricComparison, String); 6] = [
        ("Total sales", &metrics.total_sales, money(&metrics.total_sales)),
        ("Orders", &metrics.order_count, count(&metrics.order_count)),
        ("Average order", &metrics.average_order_value, money(&metrics.average_order_value)),
        ("Pending", &metrics.pending_orders, count(&metrics.pending_orders)),
        ("Cancelled", &metrics.cancelled_orders, count(&metrics.cancelled_orders)),
        ("Returned", &metrics.returned_orders, count(&metrics.returned_orders)),
    ];
    for (label, metric, value) in rows {
        ctx.output
            .kv(label, &format!("{}  {}", value, format_change(metric.change_percent)));
    }

    let returning = &report.returning_customers;
    let note = if returning.sampled {
        format!(" (first {} of {} customers)", returning.sample_size, returning.distinct_customers)
    } else {
        String::new()
    };
    ctx.output
        .kv("Returning customers", &format!("{}%{}", returning.rate_percent, note));

    if !report.top_products.is_empty() {
        ctx.output.header("Top products");
        let widths = [28, 8, 14];
        ctx.output.table_row(&["PRODUCT", "QTY", "REVENUE"], &widths);
        for product in &report.top_products {
            ctx.output.table_row(
                &[
                    product.name.as_str(),
                    product.quantity.to_string().as_str(),
                    product.revenue.display().as_str(),
                ],
                &widths,
            );
        }
    }

    let active_days: Vec<_> = report.daily.iter().filter(|d| d.orders > 0).collect();
    if !active_days.is_empty() {
        ctx.output.header("Daily sales");
        let widths = [12, 8, 14];
        ctx.output.table_row(&["DATE", "ORDERS", "SALES"], &widths);
        for day in active_days {
            ctx.output.table_row(
                &[
                    day.date.to_string().as_str(),
                    day.orders.to_string().as_str(),
                    day.sales.display().as_str(),
                ],
                &widths,
            );
        }
    }

    if !report.recent_orders.is_empty() {
        ctx.output.header("Recent orders");
        let widths = [38, 20, 12, 12];
        ctx.output
            .table_row(&["ORDER", "CUSTOMER", "TOTAL", "STATUS"], &widths);
        for order in &report.recent_orders {
            ctx.output.table_row(
                &[
                    order.id.as_str(),
                    order.customer_name.as_str(),
                    order.total_amount.display().as_str(),
                    order_status_badge(order.status).as_str(),
                ],
                &widths,
            );
        }
    }
}

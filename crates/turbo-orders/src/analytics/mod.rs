//! Commerce analytics.
//!
//! Sales, order counts and customer metrics for a date window, each compared
//! against the equal-length window just before it.

mod aggregator;
mod metrics;
mod report;
mod window;

pub use aggregator::AnalyticsAggregator;
pub use metrics::{change_percent, MetricComparison, PeriodMetric};
pub use report::{
    AnalyticsReport, DailyBucket, HeadlineMetrics, RecentOrder, ReturningCustomers, TopProduct,
};
pub use window::{DateWindow, ReportWindow, MAX_HISTORY_DAYS};

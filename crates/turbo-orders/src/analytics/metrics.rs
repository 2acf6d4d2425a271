//! Period metrics and period-over-period change.

use crate::error::CommerceError;
use crate::money::Money;
use crate::order::Order;
use serde::Serialize;

/// Count, sales and average order value over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodMetric {
    pub count: u64,
    pub sales: Money,
    pub aov: Money,
}

impl PeriodMetric {
    /// Summarize orders that count toward sales.
    pub fn from_orders(orders: &[Order]) -> Result<Self, CommerceError> {
        let sales = Money::checked_sum(orders.iter().map(|o| &o.total_amount))
            .ok_or_else(|| CommerceError::Computation("sales total overflowed".to_string()))?;
        let count = orders.len() as u64;
        Ok(Self {
            count,
            sales,
            aov: average(sales, count),
        })
    }
}

/// Sales divided by count, rounded to the nearest unit. Zero when empty.
fn average(sales: Money, count: u64) -> Money {
    if count == 0 {
        return Money::zero();
    }
    Money::new((sales.amount() as f64 / count as f64).round() as i64)
}

/// Rounded percentage change from `previous` to `current`.
///
/// A zero baseline reports 100 when anything happened and 0 otherwise.
///
/// ```
/// use turbo_orders::analytics::change_percent;
///
/// assert_eq!(change_percent(150, 100), 50);
/// assert_eq!(change_percent(100, 0), 100);
/// assert_eq!(change_percent(0, 0), 0);
/// ```
pub fn change_percent(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let previous = previous as f64;
    ((current as f64 - previous) / previous * 100.0).round() as i64
}

/// A value in the current window beside the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricComparison {
    pub current: i64,
    pub previous: i64,
    pub change_percent: i64,
}

impl MetricComparison {
    pub fn new(current: i64, previous: i64) -> Self {
        Self {
            current,
            previous,
            change_percent: change_percent(current, previous),
        }
    }

    pub fn counts(current: u64, previous: u64) -> Self {
        Self::new(saturate(current), saturate(previous))
    }

    pub fn money(current: Money, previous: Money) -> Self {
        Self::new(current.amount(), previous.amount())
    }
}

fn saturate(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_percent_cases() {
        assert_eq!(change_percent(100, 0), 100);
        assert_eq!(change_percent(0, 0), 0);
        assert_eq!(change_percent(150, 100), 50);
        assert_eq!(change_percent(50, 100), -50);
        assert_eq!(change_percent(0, 100), -100);
        // 1/3 -> 33.33
        assert_eq!(change_percent(4, 3), 33);
        // 2/3 -> 66.67
        assert_eq!(change_percent(5, 3), 67);
    }

    #[test]
    fn test_change_percent_extremes_do_not_overflow() {
        assert_eq!(change_percent(i64::MAX, i64::MIN), -200);
        assert_eq!(change_percent(i64::MIN, 1), i64::MIN);
        assert_eq!(change_percent(-500, 1000), -150);
    }

    #[test]
    fn test_empty_period() {
        let metric = PeriodMetric::from_orders(&[]).unwrap();
        assert_eq!(metric, PeriodMetric::default());
    }

    #[test]
    fn test_average_rounds() {
        assert_eq!(average(Money::new(3000), 2), Money::new(1500));
        assert_eq!(average(Money::new(1000), 3), Money::new(333));
        assert_eq!(average(Money::new(2000), 3), Money::new(667));
    }

    #[test]
    fn test_comparison_from_counts() {
        let cmp = MetricComparison::counts(3, 2);
        assert_eq!(cmp.change_percent, 50);
    }
}

//! Coupon codes and the discount they resolve to.

use crate::error::CommerceError;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CouponValue {
    /// Percentage off the subtotal (0.0 - 100.0), rounded half-up.
    Percentage(f64),
    /// Fixed amount off.
    Fixed(Money),
}

/// A coupon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Code entered at checkout (e.g., "EID10").
    pub code: String,
    pub value: CouponValue,
    /// Subtotal required before the coupon applies.
    #[serde(default)]
    pub minimum_subtotal: Option<Money>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Maximum number of uses (None = unlimited).
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
}

fn default_active() -> bool {
    true
}

impl Coupon {
    /// Create a percentage coupon.
    pub fn percentage(code: impl Into<String>, percent: f64) -> Self {
        Self::with_value(code, CouponValue::Percentage(percent))
    }

    /// Create a fixed amount coupon.
    pub fn fixed_amount(code: impl Into<String>, amount: Money) -> Self {
        Self::with_value(code, CouponValue::Fixed(amount))
    }

    fn with_value(code: impl Into<String>, value: CouponValue) -> Self {
        Self {
            code: code.into(),
            value,
            minimum_subtotal: None,
            expires_at: None,
            active: true,
            usage_limit: None,
            usage_count: 0,
        }
    }

    pub fn with_minimum_subtotal(mut self, amount: Money) -> Self {
        self.minimum_subtotal = Some(amount);
        self
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.usage_count >= limit)
            .unwrap_or(false)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }

    /// Resolve the discount this coupon grants on `subtotal` at `now`.
    ///
    /// Fixed amounts are returned as-is, even when larger than the subtotal.
    pub fn discount_for(&self, subtotal: Money, now: DateTime<Utc>) -> Result<Money, CommerceError> {
        let reject = |reason: &str| {
            CommerceError::Validation(format!("coupon {} {}", self.code, reason))
        };

        if !self.active {
            return Err(reject("is not active"));
        }
        if self.is_expired(now) {
            return Err(reject("has expired"));
        }
        if self.is_exhausted() {
            return Err(reject("has reached its usage limit"));
        }
        if let Some(minimum) = self.minimum_subtotal {
            if subtotal < minimum {
                return Err(reject(&format!("requires a subtotal of at least {}", minimum)));
            }
        }

        match self.value {
            CouponValue::Percentage(percent) => {
                if !(0.0..=100.0).contains(&percent) {
                    return Err(reject("has an invalid percentage"));
                }
                subtotal
                    .percent_half_up(percent)
                    .ok_or(CommerceError::Overflow)
            }
            CouponValue::Fixed(amount) => Ok(amount),
        }
    }

    /// Increment usage count.
    pub fn record_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
    }
}

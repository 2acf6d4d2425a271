//! Pricing module.
//!
//! Turns cart lines plus shipping, tax and coupon settings into a price
//! breakdown. Pure computation; nothing here touches storage.

mod calculator;
mod coupon;

pub use calculator::{compute_price, PriceBreakdown, PricingLine};
pub use coupon::{Coupon, CouponValue};

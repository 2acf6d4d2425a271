//! Order price calculation.

use crate::config::{ShippingConfig, TaxConfig};
use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A cart line as seen by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingLine {
    /// Price actually charged per unit (subscriber price already applied).
    pub unit_price: Money,
    /// Quantity, at least 1.
    pub quantity: u32,
    /// Catalog price before any subscriber discount, for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
}

impl PricingLine {
    pub fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
            original_price: None,
        }
    }

    pub fn with_original_price(mut self, original: Money) -> Self {
        self.original_price = Some(original);
        self
    }

    /// Amount saved on this line versus the original price, if any.
    pub fn savings(&self) -> Option<Money> {
        let original = self.original_price?;
        if original <= self.unit_price {
            return None;
        }
        original
            .checked_sub(self.unit_price)?
            .checked_mul(i64::from(self.quantity))
    }
}

/// Complete pricing breakdown for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Sum of unit price times quantity.
    pub subtotal: Money,
    /// Flat rate, or zero at/above the free-shipping threshold.
    pub shipping_cost: Money,
    /// Tax on the subtotal.
    pub tax: Money,
    /// Coupon discount.
    pub discount: Money,
    /// subtotal - discount + shipping + tax.
    pub total: Money,
    /// Subscriber savings already baked into unit prices. Display only.
    #[serde(default)]
    pub subscriber_savings: Money,
}

impl PriceBreakdown {
    /// Check the total invariant.
    pub fn is_consistent(&self) -> bool {
        self.subtotal
            .checked_sub(self.discount)
            .and_then(|m| m.checked_add(self.shipping_cost))
            .and_then(|m| m.checked_add(self.tax))
            == Some(self.total)
    }

    pub fn ships_free(&self) -> bool {
        self.shipping_cost.is_zero()
    }

    /// Savings line for display, e.g. "You saved Rs. 300".
    pub fn savings_message(&self) -> Option<String> {
        if self.subscriber_savings.is_positive() {
            Some(format!("You saved {}", self.subscriber_savings))
        } else {
            None
        }
    }
}

/// Price a set of cart lines.
///
/// The discount is applied as given and is not checked against the
/// subtotal, so an oversized coupon produces a negative total.
pub fn compute_price(
    items: &[PricingLine],
    shipping: &ShippingConfig,
    tax: &TaxConfig,
    discount: Option<Money>,
) -> Result<PriceBreakdown, CommerceError> {
    let mut subtotal = Money::zero();
    let mut subscriber_savings = Money::zero();

    for item in items {
        if item.quantity == 0 {
            return Err(CommerceError::Validation(
                "line item quantity must be at least 1".to_string(),
            ));
        }
        let line_total = item
            .unit_price
            .checked_mul(i64::from(item.quantity))
            .ok_or(CommerceError::Overflow)?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CommerceError::Overflow)?;
        if let Some(saved) = item.savings() {
            subscriber_savings = subscriber_savings
                .checked_add(saved)
                .ok_or(CommerceError::Overflow)?;
        }
    }

    let shipping_cost = if subtotal >= shipping.free_shipping_threshold {
        Money::zero()
    } else {
        shipping.flat_rate
    };

    let tax_amount = if tax.enabled {
        subtotal
            .percent_half_up(tax.rate_percent)
            .ok_or(CommerceError::Overflow)?
    } else {
        Money::zero()
    };

    let discount = discount.unwrap_or_default();
    let total = subtotal
        .checked_sub(discount)
        .and_then(|m| m.checked_add(shipping_cost))
        .and_then(|m| m.checked_add(tax_amount))
        .ok_or(CommerceError::Overflow)?;

    if total.is_negative() {
        tracing::warn!(
            subtotal = subtotal.amount(),
            discount = discount.amount(),
            total = total.amount(),
            "discount exceeds order value; total is negative"
        );
    }

    Ok(PriceBreakdown {
        subtotal,
        shipping_cost,
        tax: tax_amount,
        discount,
        total,
        subscriber_savings,
    })
}

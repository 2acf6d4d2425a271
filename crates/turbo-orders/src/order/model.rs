//! Order types.

use crate::error::CommerceError;
use crate::ids::{AbandonedCartId, OrderId, ProductId, UserId};
use crate::money::Money;
use crate::order::address::{non_blank, ShippingAddress};
use crate::pricing::{PriceBreakdown, PricingLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    Pending,
    /// Order confirmed with the customer.
    Confirmed,
    /// Order being prepared.
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }

    /// Awaiting fulfillment work.
    pub fn is_pending_like(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Confirmed
        )
    }

    /// Whether the order's total counts as revenue.
    pub fn counts_toward_sales(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CommerceError::Validation(format!("unknown order status: {}", s)))
    }
}

/// Payment method tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    Card,
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

/// The account that placed an order, when not a guest checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A line item snapshot. Name and prices are frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
}

impl OrderLineItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            original_price: None,
        }
    }

    pub fn with_original_price(mut self, original: Money) -> Self {
        self.original_price = Some(original);
        self
    }

    /// Unit price times quantity, saturating.
    pub fn line_total(&self) -> Money {
        Money::new(
            self.unit_price
                .amount()
                .saturating_mul(i64::from(self.quantity)),
        )
    }

    /// View this line as calculator input.
    pub fn pricing_line(&self) -> PricingLine {
        PricingLine {
            unit_price: self.unit_price,
            quantity: self.quantity,
            original_price: self.original_price,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub discount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub is_paid: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    /// Abandoned cart this order was recovered from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned_cart_id: Option<AbandonedCartId>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending, unpaid order from a validated payload.
    pub(crate) fn place(new: NewOrder, now: DateTime<Utc>) -> Self {
        let NewOrder {
            items,
            pricing,
            coupon_code,
            shipping_address,
            payment_method,
            customer,
            abandoned_cart_id,
        } = new;
        Self {
            id: OrderId::generate(),
            items,
            subtotal: pricing.subtotal,
            shipping_cost: pricing.shipping_cost,
            tax: pricing.tax,
            discount: pricing.discount,
            coupon_code,
            total_amount: pricing.total,
            shipping_address: shipping_address.normalized(),
            payment_method,
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            tracking_id: None,
            courier_company: None,
            customer,
            abandoned_cart_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the total invariant on the persisted amounts.
    pub fn totals_consistent(&self) -> bool {
        self.price_breakdown().is_consistent()
    }

    /// The persisted amounts as a breakdown.
    pub fn price_breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax: self.tax,
            discount: self.discount,
            total: self.total_amount,
            subscriber_savings: self.subscriber_savings(),
        }
    }

    /// Savings from subscriber pricing, for display alongside the total.
    ///
    /// Saturates at the largest representable amount.
    pub fn subscriber_savings(&self) -> Money {
        let savings: Vec<Money> = self
            .items
            .iter()
            .filter_map(|item| item.pricing_line().savings())
            .collect();
        Money::checked_sum(&savings).unwrap_or(Money::new(i64::MAX))
    }

    /// Get total item count.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Account name, else shipping name, else "Guest".
    pub fn customer_display_name(&self) -> String {
        self.customer
            .as_ref()
            .and_then(|c| non_blank(c.name.as_deref()))
            .or_else(|| non_blank(Some(self.shipping_address.full_name.as_str())))
            .unwrap_or("Guest")
            .to_string()
    }

    /// Where order emails go: shipping email, else account email.
    pub fn recipient_email(&self) -> Option<&str> {
        self.shipping_address.contact_email().or_else(|| {
            self.customer
                .as_ref()
                .and_then(|c| non_blank(c.email.as_deref()))
        })
    }

    /// Tracking id, if present and non-blank.
    pub fn tracking(&self) -> Option<&str> {
        non_blank(self.tracking_id.as_deref())
    }
}

/// Payload for placing an order. Pricing is computed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderLineItem>,
    pub pricing: PriceBreakdown,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub abandoned_cart_id: Option<AbandonedCartId>,
}

impl NewOrder {
    /// Check the payload before it is persisted.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.items.is_empty() {
            return Err(CommerceError::Validation(
                "order must contain at least one line item".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(CommerceError::Validation(format!(
                "line item {} has quantity 0",
                item.product_id
            )));
        }

        let missing = self.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(CommerceError::Validation(format!(
                "shipping address is missing: {}",
                missing.join(", ")
            )));
        }

        if !self.pricing.is_consistent() {
            return Err(CommerceError::Validation(format!(
                "total {} does not equal subtotal - discount + shipping + tax",
                self.pricing.total.amount()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_order() -> NewOrder {
        NewOrder {
            items: vec![OrderLineItem::new("p1", "Lawn Suit", Money::new(2400), 2)],
            pricing: PriceBreakdown {
                subtotal: Money::new(4800),
                shipping_cost: Money::new(200),
                tax: Money::zero(),
                discount: Money::zero(),
                total: Money::new(5000),
                subscriber_savings: Money::zero(),
            },
            coupon_code: None,
            shipping_address: ShippingAddress::new("Sara", "1 Canal Rd", "Lahore", "", "0300"),
            payment_method: PaymentMethod::Cod,
            customer: None,
            abandoned_cart_id: None,
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!(" returned ".parse::<OrderStatus>().unwrap(), OrderStatus::Returned);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_groups() {
        assert!(OrderStatus::Confirmed.is_pending_like());
        assert!(!OrderStatus::Shipped.is_pending_like());
        assert!(!OrderStatus::Cancelled.counts_toward_sales());
        assert!(!OrderStatus::Returned.counts_toward_sales());
        assert!(OrderStatus::Delivered.counts_toward_sales());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_valid_payload() {
        assert!(sample_new_order().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut new = sample_new_order();
        new.items.clear();
        assert!(matches!(new.validate(), Err(CommerceError::Validation(_))));
    }

    #[test]
    fn test_incomplete_address_rejected() {
        let mut new = sample_new_order();
        new.shipping_address.phone = String::new();
        let err = new.validate().unwrap_err();
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_inconsistent_total_rejected() {
        let mut new = sample_new_order();
        new.pricing.total = Money::new(4800);
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_place_starts_pending_and_unpaid() {
        let order = Order::place(sample_new_order(), Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_paid);
        assert!(order.paid_at.is_none());
        assert!(order.totals_consistent());
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn test_customer_display_name_fallbacks() {
        let mut order = Order::place(sample_new_order(), Utc::now());
        assert_eq!(order.customer_display_name(), "Sara");

        order.customer = Some(CustomerRef {
            id: UserId::new("u1"),
            name: Some("Sara Ahmed".to_string()),
            email: None,
        });
        assert_eq!(order.customer_display_name(), "Sara Ahmed");

        order.customer = None;
        order.shipping_address.full_name = " ".to_string();
        assert_eq!(order.customer_display_name(), "Guest");
    }

    #[test]
    fn test_recipient_email_prefers_shipping() {
        let mut order = Order::place(sample_new_order(), Utc::now());
        assert_eq!(order.recipient_email(), None);

        order.customer = Some(CustomerRef {
            id: UserId::new("u1"),
            name: None,
            email: Some("account@example.com".to_string()),
        });
        assert_eq!(order.recipient_email(), Some("account@example.com"));

        order.shipping_address.email = Some("ship@example.com".to_string());
        assert_eq!(order.recipient_email(), Some("ship@example.com"));
    }

    #[test]
    fn test_subscriber_savings_display_only() {
        let mut new = sample_new_order();
        new.items[0] = new.items[0].clone().with_original_price(Money::new(2500));
        let order = Order::place(new, Utc::now());
        assert_eq!(order.subscriber_savings(), Money::new(200));
        assert_eq!(order.total_amount, Money::new(5000));
        assert!(order.totals_consistent());
    }

    #[test]
    fn test_subscriber_savings_saturates() {
        let mut new = sample_new_order();
        let line = OrderLineItem::new("p9", "Bridal", Money::new(1), 1)
            .with_original_price(Money::new(i64::MAX));
        new.items = vec![line.clone(), line];
        let order = Order::place(new, Utc::now());
        assert_eq!(order.subscriber_savings(), Money::new(i64::MAX));
    }

    #[test]
    fn test_place_trims_shipping_email() {
        let mut new = sample_new_order();
        new.shipping_address.email = Some(" sara@example.com ".to_string());
        let order = Order::place(new, Utc::now());
        assert_eq!(order.shipping_address.email.as_deref(), Some("sara@example.com"));

        let mut new = sample_new_order();
        new.shipping_address.email = Some("   ".to_string());
        let order = Order::place(new, Utc::now());
        assert_eq!(order.shipping_address.email, None);
    }

    #[test]
    fn test_timestamps_serialize_as_millis() {
        let order = Order::place(sample_new_order(), Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert!(json["created_at"].is_i64());
        assert!(json["paid_at"].is_null());
    }
}

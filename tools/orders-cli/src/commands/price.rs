//! Cart pricing command.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use turbo_orders::money::Money;
use turbo_orders::pricing::{Coupon, PriceBreakdown, PricingLine};
use turbo_orders::CommerceEngine;
use turbo_store::DocumentStore;

use super::PriceArgs;
use crate::context::Context;

#[derive(Deserialize)]
#[serde(untagged)]
enum CartFile {
    Lines(Vec<PricingLine>),
    Cart { items: Vec<PricingLine> },
}

impl CartFile {
    fn into_lines(self) -> Vec<PricingLine> {
        match self {
            CartFile::Lines(items) | CartFile::Cart { items } => items,
        }
    }
}

/// Run the price command.
pub async fn run(args: PriceArgs, ctx: &Context) -> Result<()> {
    let lines = ctx.read_json::<CartFile>(&args.cart)?.into_lines();
    let (engine, _dispatcher) =
        CommerceEngine::with_store(ctx.config.clone(), Arc::new(DocumentStore::new()));

    let (price, coupon_code) = match args.coupon {
        Some(ref path) => {
            let coupon: Coupon = ctx.read_json(path)?;
            let price = engine.compute_price_with_coupon(&lines, &coupon)?;
            (price, Some(coupon.code))
        }
        None => {
            let discount = args.discount.map(Money::new);
            (engine.compute_price(&lines, discount)?, None)
        }
    };

    if ctx.output.is_json() {
        ctx.output.json(&price);
        return Ok(());
    }

    print_breakdown(ctx, &price, lines.len(), coupon_code.as_deref());
    Ok(())
}

fn print_breakdown(ctx: &Context, price: &PriceBreakdown, line_count: usize, coupon: Option<&str>) {
    ctx.output.header(&format!("Price ({} lines)", line_count));
    ctx.output.kv("Subtotal", &price.subtotal.display());

    if price.ships_free() {
        ctx.output.kv("Shipping", "Free");
    } else {
        ctx.output.kv("Shipping", &price.shipping_cost.display());
    }
    if !price.tax.is_zero() {
        ctx.output.kv("Tax", &price.tax.display());
    }
    if !price.discount.is_zero() {
        let label = match coupon {
            Some(code) => format!("Discount ({})", code),
            None => "Discount".to_string(),
        };
        ctx.output.kv(&label, &format!("-{}", price.discount.display()));
    }
    ctx.output.kv("Total", &price.total.display());

    if let Some(message) = price.savings_message() {
        ctx.output.success(&message);
    }
    if price.total.is_negative() {
        ctx.output.warn("Discount exceeds the order value; total is negative");
    }

    let threshold = ctx.config.shipping.free_shipping_threshold;
    if !price.ships_free() {
        if let Some(short) = threshold.checked_sub(price.subtotal) {
            ctx.output.info(&format!("Add {} more for free shipping", short.display()));
        }
    }
}

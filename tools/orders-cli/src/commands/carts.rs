//! Abandoned cart listing command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;
use turbo_orders::recovery::{AbandonedCart, RecoveryStatus};
use turbo_orders::store::ABANDONED_CARTS;
use turbo_orders::CommerceEngine;
use turbo_store::DocumentStore;

use super::CartsArgs;
use crate::context::Context;
use crate::output::recovery_badge;

#[derive(Serialize)]
struct CartRow<'a> {
    #[serde(flatten)]
    cart: &'a AbandonedCart,
    status: RecoveryStatus,
}

/// Run the carts command.
pub async fn run(args: CartsArgs, ctx: &Context) -> Result<()> {
    let carts: Vec<AbandonedCart> = ctx.read_json(&args.carts)?;

    let store = Arc::new(DocumentStore::new());
    store
        .import(ABANDONED_CARTS, carts.into_iter().map(|c| (c.id.to_string(), c)))
        .await
        .context("Failed to load carts dump")?;

    let (engine, _dispatcher) = CommerceEngine::with_store(ctx.config.clone(), store);
    let recent = engine.recent_abandoned_carts(args.limit).await?;

    if ctx.output.is_json() {
        let rows: Vec<CartRow<'_>> = recent
            .iter()
            .map(|(cart, status)| CartRow {
                cart,
                status: *status,
            })
            .collect();
        ctx.output.json(&rows);
        return Ok(());
    }

    if recent.is_empty() {
        ctx.output.info("No abandoned carts");
        return Ok(());
    }

    ctx.output.header(&format!("Abandoned carts ({})", recent.len()));
    let widths = [24, 28, 12, 17, 10];
    ctx.output
        .table_row(&["CONTACT", "NAME", "TOTAL", "UPDATED", "STATUS"], &widths);
    for (cart, status) in &recent {
        let contact = cart
            .contact
            .email
            .as_deref()
            .or(cart.contact.phone.as_deref())
            .or(cart.session_id.as_deref())
            .unwrap_or("-");
        ctx.output.table_row(
            &[
                contact,
                cart.contact.name.as_deref().unwrap_or("-"),
                cart.total_amount.display().as_str(),
                cart.updated_at.format("%Y-%m-%d %H:%M").to_string().as_str(),
                recovery_badge(*status).as_str(),
            ],
            &widths,
        );
    }

    let recovered = recent
        .iter()
        .filter(|(_, s)| *s == RecoveryStatus::Recovered)
        .count();
    ctx.output
        .success(&format!("{} of {} recovered", recovered, recent.len()));
    Ok(())
}

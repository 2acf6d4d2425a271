//! Abandoned-cart recovery.

mod cart;
mod tracker;

pub use cart::{AbandonedCart, CartContact, CartItemSnapshot, CartKey, CartSnapshot, RecoveryStatus};
pub use tracker::RecoveryTracker;

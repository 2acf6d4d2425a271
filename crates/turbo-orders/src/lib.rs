//! Order lifecycle, abandoned-cart recovery and commerce analytics for
//! TurboCommerce storefronts.
//!
//! - **Pricing**: subtotal, flat-rate shipping with a free threshold, tax, coupons
//! - **Orders**: creation, status updates, payment, tracking, customer notices
//! - **Recovery**: abandoned cart snapshots and the recovery funnel
//! - **Analytics**: period-over-period sales dashboard
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_orders::prelude::*;
//! use turbo_store::DocumentStore;
//!
//! let (engine, dispatcher) =
//!     CommerceEngine::with_store(EngineConfig::default(), Arc::new(DocumentStore::new()));
//! tokio::spawn(async move { dispatcher.run(&LogNotifier).await });
//!
//! let price = engine.compute_price(&[PricingLine::new(Money::new(4800), 1)], None)?;
//! assert_eq!(price.total, Money::new(5000));
//!
//! let id = engine.create_order(new_order).await?;
//! engine.set_order_status(&id, OrderStatus::Delivered).await?;
//!
//! let report = engine.get_analytics(Some("2024-06-01"), None).await?;
//! println!("Sales: {}", report.current.sales);
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub mod analytics;
pub mod engine;
pub mod notify;
pub mod order;
pub mod pricing;
pub mod recovery;
pub mod repository;
pub mod store;

pub use config::EngineConfig;
pub use engine::CommerceEngine;
pub use error::CommerceError;
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{AnalyticsConfig, EngineConfig, NotificationConfig, ShippingConfig, TaxConfig};
    pub use crate::engine::CommerceEngine;
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Pricing
    pub use crate::pricing::{compute_price, Coupon, CouponValue, PriceBreakdown, PricingLine};

    // Orders
    pub use crate::order::{
        CustomerRef, NewOrder, Order, OrderLineItem, OrderStatus, PaymentMethod, ShippingAddress,
    };

    // Notifications
    pub use crate::notify::{
        DispatchReport, Dispatcher, LogNotifier, Notification, NotificationKind, Notifier,
        NotifyError,
    };

    // Recovery
    pub use crate::recovery::{AbandonedCart, CartContact, CartItemSnapshot, CartSnapshot, RecoveryStatus};

    // Analytics
    pub use crate::analytics::AnalyticsReport;
}

//! Orders and their lifecycle.

mod address;
mod lifecycle;
mod model;

pub use address::ShippingAddress;
pub(crate) use address::non_blank;
pub use lifecycle::OrderLifecycle;
pub use model::{CustomerRef, NewOrder, Order, OrderLineItem, OrderStatus, PaymentMethod};

//! Customer notifications.
//!
//! Order writes enqueue notifications; delivery happens off the write path
//! with retries.

mod event;
mod outbox;
mod retry;

pub use event::{LogNotifier, Notification, NotificationKind, Notifier, NotifyError};
pub use outbox::{DispatchReport, Dispatcher, Outbox};
pub use retry::{BackoffStrategy, RetryPolicy};

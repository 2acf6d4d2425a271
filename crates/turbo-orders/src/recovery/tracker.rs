//! Recovery funnel tracking.

use crate::error::CommerceError;
use crate::ids::AbandonedCartId;
use crate::order::Order;
use crate::recovery::cart::{AbandonedCart, CartSnapshot, RecoveryStatus};
use crate::repository::CartRepository;
use chrono::Utc;
use std::sync::Arc;

/// Tracks abandoned carts through sent, clicked and recovered.
#[derive(Clone)]
pub struct RecoveryTracker {
    carts: Arc<dyn CartRepository>,
}

impl RecoveryTracker {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    /// Upsert a cart by its identity key.
    pub async fn record_snapshot(
        &self,
        snapshot: CartSnapshot,
    ) -> Result<AbandonedCartId, CommerceError> {
        let snapshot = snapshot.normalized();
        let key = snapshot.key()?;
        let now = Utc::now();

        match self.carts.find_by_key(&key).await? {
            Some(mut cart) => {
                cart.refresh(snapshot, now);
                self.carts.save(&cart).await?;
                tracing::debug!(cart_id = %cart.id, key = %key, "abandoned cart refreshed");
                Ok(cart.id)
            }
            None => {
                let cart = AbandonedCart::from_snapshot(snapshot, now);
                self.carts.insert(&cart).await?;
                tracing::info!(cart_id = %cart.id, key = %key, "abandoned cart recorded");
                Ok(cart.id)
            }
        }
    }

    /// Record that a recovery message went out. Re-sending moves the stamp.
    pub async fn mark_sent(&self, id: &AbandonedCartId) -> Result<AbandonedCart, CommerceError> {
        let mut cart = self.load(id).await?;
        cart.recovery_sent_at = Some(Utc::now());
        self.carts.save(&cart).await?;
        tracing::info!(cart_id = %id, "recovery message sent");
        Ok(cart)
    }

    /// Record the first click on a recovery link.
    pub async fn mark_clicked(&self, id: &AbandonedCartId) -> Result<AbandonedCart, CommerceError> {
        let mut cart = self.load(id).await?;
        if cart.clicked_at.is_none() {
            cart.clicked_at = Some(Utc::now());
            self.carts.save(&cart).await?;
            tracing::info!(cart_id = %id, "recovery link clicked");
        }
        Ok(cart)
    }

    /// Mark a cart recovered. There is no way back.
    pub async fn mark_recovered(
        &self,
        id: &AbandonedCartId,
    ) -> Result<AbandonedCart, CommerceError> {
        let mut cart = self.load(id).await?;
        if !cart.is_recovered {
            cart.is_recovered = true;
            self.carts.save(&cart).await?;
            tracing::info!(cart_id = %id, "abandoned cart recovered");
        }
        Ok(cart)
    }

    /// Mark the cart an order came from as recovered.
    ///
    /// Returns `Ok(None)` when the order has no cart reference or the cart is
    /// unknown; the latter is logged.
    pub async fn recover_from_order(
        &self,
        order: &Order,
    ) -> Result<Option<AbandonedCart>, CommerceError> {
        let Some(cart_id) = order.abandoned_cart_id.as_ref() else {
            return Ok(None);
        };
        match self.mark_recovered(cart_id).await {
            Ok(cart) => Ok(Some(cart)),
            Err(CommerceError::NotFound { .. }) => {
                tracing::warn!(
                    order_id = %order.id,
                    cart_id = %cart_id,
                    "order references an unknown abandoned cart"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, id: &AbandonedCartId) -> Result<AbandonedCart, CommerceError> {
        self.load(id).await
    }

    /// Most recently active carts with their derived status.
    pub async fn list_recent(
        &self,
        limit: usize,
    ) -> Result<Vec<(AbandonedCart, RecoveryStatus)>, CommerceError> {
        let carts = self.carts.list_recent(limit).await?;
        Ok(carts
            .into_iter()
            .map(|cart| {
                let status = cart.status();
                (cart, status)
            })
            .collect())
    }

    async fn load(&self, id: &AbandonedCartId) -> Result<AbandonedCart, CommerceError> {
        self.carts
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::cart_not_found(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::recovery::cart::CartContact;
    use crate::store::DocumentCartRepository;
    use turbo_store::DocumentStore;

    fn tracker() -> RecoveryTracker {
        let store = Arc::new(DocumentStore::new());
        RecoveryTracker::new(Arc::new(DocumentCartRepository::new(store)))
    }

    fn snapshot(email: &str, total: i64) -> CartSnapshot {
        CartSnapshot {
            session_id: None,
            contact: CartContact {
                email: Some(email.to_string()),
                ..Default::default()
            },
            items: Vec::new(),
            total_amount: Money::new(total),
        }
    }

    #[tokio::test]
    async fn test_snapshot_upserts_by_key() {
        let tracker = tracker();
        let first = tracker.record_snapshot(snapshot("a@example.com", 1000)).await.unwrap();
        let second = tracker.record_snapshot(snapshot("a@example.com", 2500)).await.unwrap();
        assert_eq!(first, second);

        let cart = tracker.get(&first).await.unwrap();
        assert_eq!(cart.total_amount, Money::new(2500));

        let other = tracker.record_snapshot(snapshot("b@example.com", 10)).await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_snapshot_without_identity_rejected() {
        let tracker = tracker();
        let err = tracker.record_snapshot(CartSnapshot::default()).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_snapshot_does_not_reset_flags() {
        let tracker = tracker();
        let id = tracker.record_snapshot(snapshot("a@example.com", 1000)).await.unwrap();
        tracker.mark_sent(&id).await.unwrap();
        tracker.mark_clicked(&id).await.unwrap();

        tracker.record_snapshot(snapshot("a@example.com", 1200)).await.unwrap();
        let cart = tracker.get(&id).await.unwrap();
        assert_eq!(cart.status(), RecoveryStatus::Clicked);
    }

    #[tokio::test]
    async fn test_repeat_click_keeps_first_timestamp() {
        let tracker = tracker();
        let id = tracker.record_snapshot(snapshot("a@example.com", 1000)).await.unwrap();
        let first = tracker.mark_clicked(&id).await.unwrap().clicked_at;
        let second = tracker.mark_clicked(&id).await.unwrap().clicked_at;
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resend_moves_sent_timestamp() {
        let tracker = tracker();
        let id = tracker.record_snapshot(snapshot("a@example.com", 1000)).await.unwrap();
        let first = tracker.mark_sent(&id).await.unwrap().recovery_sent_at.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        tracker.mark_sent(&id).await.unwrap();

        let second = tracker.get(&id).await.unwrap().recovery_sent_at.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_recovered_is_sticky() {
        let tracker = tracker();
        let id = tracker.record_snapshot(snapshot("a@example.com", 1000)).await.unwrap();
        tracker.mark_recovered(&id).await.unwrap();
        tracker.mark_sent(&id).await.unwrap();
        let cart = tracker.mark_recovered(&id).await.unwrap();
        assert!(cart.is_recovered);
        assert_eq!(cart.status(), RecoveryStatus::Recovered);
    }

    #[tokio::test]
    async fn test_unknown_cart_not_found() {
        let tracker = tracker();
        let err = tracker.mark_sent(&AbandonedCartId::new("missing")).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let tracker = tracker();
        let a = tracker.record_snapshot(snapshot("a@example.com", 1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = tracker.record_snapshot(snapshot("b@example.com", 2)).await.unwrap();
        tracker.mark_sent(&b).await.unwrap();

        let recent = tracker.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0.id, b);
        assert_eq!(recent[0].1, RecoveryStatus::Sent);
        assert_eq!(recent[1].0.id, a);
    }
}

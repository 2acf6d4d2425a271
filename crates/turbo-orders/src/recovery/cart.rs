//! Abandoned cart records.

use crate::error::CommerceError;
use crate::ids::{AbandonedCartId, ProductId};
use crate::money::Money;
use crate::order::non_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How to reach the shopper who left the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CartContact {
    /// Trim every field and drop blank ones.
    fn normalized(self) -> Self {
        let clean = |v: Option<String>| non_blank(v.as_deref()).map(str::to_string);
        Self {
            email: clean(self.email),
            phone: clean(self.phone),
            name: clean(self.name),
        }
    }
}

/// A cart line as it was when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemSnapshot {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A cart state reported by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub contact: CartContact,
    #[serde(default)]
    pub items: Vec<CartItemSnapshot>,
    #[serde(default)]
    pub total_amount: Money,
}

impl CartSnapshot {
    pub(crate) fn normalized(self) -> Self {
        Self {
            session_id: non_blank(self.session_id.as_deref()).map(str::to_string),
            contact: self.contact.normalized(),
            ..self
        }
    }

    /// Identity used to match this snapshot to an existing cart.
    pub fn key(&self) -> Result<CartKey, CommerceError> {
        CartKey::resolve(self.session_id.as_deref(), &self.contact)
    }
}

/// Cart identity: session id, else email, else phone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartKey {
    Session(String),
    Email(String),
    Phone(String),
}

impl CartKey {
    pub fn resolve(session_id: Option<&str>, contact: &CartContact) -> Result<Self, CommerceError> {
        if let Some(session) = non_blank(session_id) {
            return Ok(CartKey::Session(session.to_string()));
        }
        if let Some(email) = non_blank(contact.email.as_deref()) {
            return Ok(CartKey::Email(email.to_string()));
        }
        if let Some(phone) = non_blank(contact.phone.as_deref()) {
            return Ok(CartKey::Phone(phone.to_string()));
        }
        Err(CommerceError::Validation(
            "cart snapshot needs a session id, email or phone".to_string(),
        ))
    }

    /// Stored field path this key matches on.
    pub fn field(&self) -> &'static str {
        match self {
            CartKey::Session(_) => "session_id",
            CartKey::Email(_) => "contact.email",
            CartKey::Phone(_) => "contact.phone",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CartKey::Session(v) | CartKey::Email(v) | CartKey::Phone(v) => v,
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field(), self.value())
    }
}

/// Where a cart is in the recovery funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Pending,
    Sent,
    Clicked,
    Recovered,
}

impl RecoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStatus::Pending => "pending",
            RecoveryStatus::Sent => "sent",
            RecoveryStatus::Clicked => "clicked",
            RecoveryStatus::Recovered => "recovered",
        }
    }
}

impl fmt::Display for RecoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked abandoned cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedCart {
    pub id: AbandonedCartId,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub contact: CartContact,
    #[serde(default)]
    pub items: Vec<CartItemSnapshot>,
    pub total_amount: Money,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub recovery_sent_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub clicked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recovered: bool,
}

impl AbandonedCart {
    pub(crate) fn from_snapshot(snapshot: CartSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            id: AbandonedCartId::generate(),
            session_id: snapshot.session_id,
            contact: snapshot.contact,
            items: snapshot.items,
            total_amount: snapshot.total_amount,
            updated_at: now,
            recovery_sent_at: None,
            clicked_at: None,
            is_recovered: false,
        }
    }

    /// Take the snapshot's contents. Recovery flags are left alone.
    pub(crate) fn refresh(&mut self, snapshot: CartSnapshot, now: DateTime<Utc>) {
        self.session_id = snapshot.session_id.or(self.session_id.take());
        self.contact = snapshot.contact;
        self.items = snapshot.items;
        self.total_amount = snapshot.total_amount;
        self.updated_at = now;
    }

    /// Derived funnel status, most advanced stage first.
    pub fn status(&self) -> RecoveryStatus {
        if self.is_recovered {
            RecoveryStatus::Recovered
        } else if self.clicked_at.is_some() {
            RecoveryStatus::Clicked
        } else if self.recovery_sent_at.is_some() {
            RecoveryStatus::Sent
        } else {
            RecoveryStatus::Pending
        }
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

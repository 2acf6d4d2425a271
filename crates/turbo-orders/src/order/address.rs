//! Shipping address.

use serde::{Deserialize, Serialize};

/// Where an order ships, and who to contact about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ShippingAddress {
    /// Create a new address.
    pub fn new(
        full_name: impl Into<String>,
        street_address: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            street_address: street_address.into(),
            city: city.into(),
            postal_code: postal_code.into(),
            phone: phone.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.full_name) {
            missing.push("full name");
        }
        if is_blank(&self.street_address) {
            missing.push("street address");
        }
        if is_blank(&self.city) {
            missing.push("city");
        }
        if is_blank(&self.phone) {
            missing.push("phone");
        }
        missing
    }

    /// Check if address has everything needed to ship.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Trim the email and drop it when blank.
    pub(crate) fn normalized(self) -> Self {
        Self {
            email: non_blank(self.email.as_deref()).map(str::to_string),
            ..self
        }
    }

    /// Shipping email, if present and non-blank.
    pub fn contact_email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street_address.as_str(), self.city.as_str()];
        if !is_blank(&self.postal_code) {
            parts.push(self.postal_code.as_str());
        }
        parts.join(", ")
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

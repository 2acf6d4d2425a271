//! Engine configuration.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration. Files ending in `.json` are parsed as JSON, anything else as
//! TOML.

use crate::error::CommerceError;
use crate::money::Money;
use crate::notify::{BackoffStrategy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub shipping: ShippingConfig,

    #[serde(default)]
    pub tax: TaxConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl EngineConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommerceError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                CommerceError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Self::from_toml_str(&content)?
        };

        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CommerceError> {
        toml::from_str(content).map_err(|e| CommerceError::Config(e.to_string()))
    }

    /// Render config as TOML text.
    pub fn to_toml_string(&self) -> Result<String, CommerceError> {
        toml::to_string_pretty(self).map_err(|e| CommerceError::Config(e.to_string()))
    }
}

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Charged when the subtotal is below the threshold.
    #[serde(default = "default_flat_rate")]
    pub flat_rate: Money,

    /// Subtotals at or above this ship free.
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: Money,
}

fn default_flat_rate() -> Money {
    Money::new(200)
}

fn default_free_shipping_threshold() -> Money {
    Money::new(5000)
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            flat_rate: default_flat_rate(),
            free_shipping_threshold: default_free_shipping_threshold(),
        }
    }
}

/// Sales tax applied to the subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Percentage of the subtotal, e.g. `17.0` for 17%.
    #[serde(default)]
    pub rate_percent: f64,
}

/// Backoff kinds accepted in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    None,
    Fixed,
    #[default]
    Exponential,
}

/// Retry settings for outbound notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Total send attempts per notification, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: BackoffKind,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2_000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffKind::default(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl NotificationConfig {
    /// Build the retry policy used by the notification dispatcher.
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.base_delay_ms);
        let backoff = match self.backoff {
            BackoffKind::None => BackoffStrategy::None,
            BackoffKind::Fixed => BackoffStrategy::Fixed(base),
            BackoffKind::Exponential => BackoffStrategy::Exponential {
                base,
                max: Duration::from_millis(self.max_delay_ms),
            },
        };
        RetryPolicy::new(self.max_attempts).with_backoff(backoff)
    }
}

/// Dashboard analytics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Window used when the caller gives no dates.
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    #[serde(default = "default_top_products")]
    pub top_products: usize,

    #[serde(default = "default_recent_orders")]
    pub recent_orders: usize,

    /// Customers checked when estimating the returning-customer rate.
    #[serde(default = "default_returning_sample_cap")]
    pub returning_sample_cap: usize,
}

fn default_window_days() -> u32 {
    30
}

fn default_top_products() -> usize {
    5
}

fn default_recent_orders() -> usize {
    10
}

fn default_returning_sample_cap() -> usize {
    50
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            top_products: default_top_products(),
            recent_orders: default_recent_orders(),
            returning_sample_cap: default_returning_sample_cap(),
        }
    }
}

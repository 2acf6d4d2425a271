//! CLI command implementations.

pub mod analytics;
pub mod carts;
pub mod config;
pub mod price;

use clap::{Args, Subcommand};

/// Arguments for the price command.
#[derive(Args)]
pub struct PriceArgs {
    /// Cart file: a JSON array of lines, or an object with an `items` array.
    pub cart: String,

    /// Discount amount to subtract.
    #[arg(short, long, conflicts_with = "coupon")]
    pub discount: Option<i64>,

    /// Coupon definition file (JSON).
    #[arg(long)]
    pub coupon: Option<String>,
}

/// Arguments for the analytics command.
#[derive(Args)]
pub struct AnalyticsArgs {
    /// Orders dump: a JSON array of orders.
    pub orders: String,

    /// Window start (RFC 3339 or YYYY-MM-DD).
    #[arg(short, long)]
    pub start: Option<String>,

    /// Window end (RFC 3339 or YYYY-MM-DD).
    #[arg(short, long)]
    pub end: Option<String>,
}

/// Arguments for the carts command.
#[derive(Args)]
pub struct CartsArgs {
    /// Abandoned carts dump: a JSON array of carts.
    pub carts: String,

    /// Show only the N most recently active carts.
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write a config file with every default spelled out.
    Init {
        /// Where to write (default: ./storefront.toml).
        #[arg(short, long)]
        path: Option<String>,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

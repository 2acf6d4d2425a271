//! Configuration management commands.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use turbo_orders::EngineConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { path, force } => init_config(path.as_deref(), force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "defaults"),
    }

    let config = &ctx.config;

    ctx.output.info("[shipping]");
    ctx.output.kv("flat_rate", &config.shipping.flat_rate.display());
    ctx.output.kv(
        "free_shipping_threshold",
        &config.shipping.free_shipping_threshold.display(),
    );

    ctx.output.info("[tax]");
    ctx.output.kv("enabled", &config.tax.enabled.to_string());
    ctx.output.kv("rate_percent", &config.tax.rate_percent.to_string());

    ctx.output.info("[notifications]");
    ctx.output
        .kv("max_attempts", &config.notifications.max_attempts.to_string());
    ctx.output
        .kv("backoff", &format!("{:?}", config.notifications.backoff).to_lowercase());
    ctx.output
        .kv("base_delay_ms", &config.notifications.base_delay_ms.to_string());
    ctx.output
        .kv("max_delay_ms", &config.notifications.max_delay_ms.to_string());

    ctx.output.info("[analytics]");
    ctx.output.kv(
        "default_window_days",
        &config.analytics.default_window_days.to_string(),
    );
    ctx.output
        .kv("top_products", &config.analytics.top_products.to_string());
    ctx.output
        .kv("recent_orders", &config.analytics.recent_orders.to_string());
    ctx.output.kv(
        "returning_sample_cap",
        &config.analytics.returning_sample_cap.to_string(),
    );

    Ok(())
}

fn init_config(path: Option<&str>, force: bool, ctx: &Context) -> Result<()> {
    let config_path = match path {
        Some(p) => ctx.resolve_path(p),
        None => ctx.cwd.join(CONFIG_NAMES[0]),
    };

    if config_path.exists() && !force {
        if ctx.output.is_json() || !console::user_attended() {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Overwrite {}?", config_path.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.warn("Config init cancelled");
            return Ok(());
        }
    }

    let content = render_default(&config_path)?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "created": config_path.display().to_string() }));
    } else {
        ctx.output
            .success(&format!("Created {}", config_path.display()));
    }
    Ok(())
}

/// Default config in the format the file extension calls for.
fn render_default(path: &Path) -> Result<String> {
    let config = EngineConfig::default();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::to_string_pretty(&config)?)
    } else {
        let body = toml::to_string_pretty(&config).context("Failed to render config")?;
        Ok(format!("# Storefront order engine configuration\n\n{}", body))
    }
}

//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use dialoguer::{Confirm, Input};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

const DEFAULT_STORE_URL: &str = "https://dockbloxx.com";

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx.config.redacted();

    if ctx.output.is_json() {
        ctx.output.json(&config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(none, using defaults)"),
    }

    // Store section
    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("base_url", &config.store.base_url);
    ctx.output.kv("api_url", &config.store.api_url());
    ctx.output.kv("consumer_key", &config.store.consumer_key);
    ctx.output.kv("consumer_secret", &config.store.consumer_secret);
    ctx.output.kv("currency", &config.store.currency);
    ctx.output.kv("per_page", &config.store.per_page.to_string());
    ctx.output.kv("timeout_ms", &config.store.timeout_ms.to_string());
    ctx.output.kv("max_retries", &config.store.max_retries.to_string());

    // Stripe section
    ctx.output.info("");
    ctx.output.info("[stripe]");
    ctx.output.kv("secret_key", &config.stripe.secret_key);
    ctx.output.kv("api_base", &config.stripe.api_base);

    if let Err(e) = ctx.config.store.validate() {
        ctx.output.info("");
        ctx.output.warn(&e.to_string());
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("dockbloxx.toml");
    let interactive = !ctx.output.is_json() && console::user_attended();

    if config_path.exists() && !force {
        let overwrite = interactive
            && Confirm::new()
                .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()?;
        if !overwrite {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }
    }

    let current = ctx.config.store.base_url.trim();
    let default_url = if current.is_empty() {
        DEFAULT_STORE_URL
    } else {
        current
    };
    let base_url = if interactive {
        Input::<String>::new()
            .with_prompt("Store URL")
            .default(default_url.to_string())
            .interact_text()?
    } else {
        default_url.to_string()
    };

    fs::write(&config_path, generate_default_config(base_url.trim()))
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output
        .success(&format!("Created: {}", config_path.display()));
    ctx.output
        .info("Add your WooCommerce REST API keys under [store], or set DOCKBLOXX_WC_KEY and DOCKBLOXX_WC_SECRET.");

    Ok(())
}

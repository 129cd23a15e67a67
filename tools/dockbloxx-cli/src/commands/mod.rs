//! CLI command implementations.

pub mod categories;
pub mod config;
pub mod coupon;
pub mod products;
pub mod quote;

use clap::{Args, Subcommand};

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Category slug (default: the whole shop).
    #[arg(long)]
    pub category: Option<String>,

    /// Page to show.
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Number of pages to load, starting at --page.
    #[arg(long, default_value = "1")]
    pub pages: u32,
}

/// Arguments for the coupon command.
#[derive(Args)]
pub struct CouponArgs {
    /// Coupon code (case-insensitive).
    pub code: String,
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Cart line as ID[:VARIATION]=QTY. Repeat for more lines.
    #[arg(short, long = "item", required = true)]
    pub items: Vec<String>,

    /// Coupon code to apply.
    #[arg(long)]
    pub coupon: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration (secrets masked).
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

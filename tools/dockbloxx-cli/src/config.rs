//! Config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use dockbloxx_data::DockbloxxConfig;

/// File names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["dockbloxx.toml", ".dockbloxx.toml", "dockbloxx.json"];

/// Load config from a file.
pub fn load_config(path: &Path) -> Result<DockbloxxConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}

/// Generate a default dockbloxx.toml config file.
pub fn generate_default_config(base_url: &str) -> String {
    format!(
        r#"# DockBloxx storefront configuration
#
# Credentials can also come from the environment:
#   DOCKBLOXX_STORE_URL, DOCKBLOXX_WC_KEY, DOCKBLOXX_WC_SECRET, DOCKBLOXX_STRIPE_KEY

[store]
base_url = "{base_url}"
consumer_key = ""
consumer_secret = ""
currency = "USD"
per_page = 12
timeout_ms = 10000
max_retries = 2

[stripe]
secret_key = ""
api_base = "https://api.stripe.com"
"#,
        base_url = base_url
    )
}

//! Client configuration.
//!
//! Mirrors the `[store]` and `[stripe]` sections of `dockbloxx.toml`.
//! Credentials can also come from the environment, which wins over the file.

use crate::endpoint::Endpoint;
use crate::retry::{FetchPolicy, RetryPolicy};
use crate::FetchError;
use dockbloxx_commerce::listing::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use dockbloxx_commerce::Currency;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_STORE_URL: &str = "DOCKBLOXX_STORE_URL";
pub const ENV_WC_KEY: &str = "DOCKBLOXX_WC_KEY";
pub const ENV_WC_SECRET: &str = "DOCKBLOXX_WC_SECRET";
pub const ENV_STRIPE_KEY: &str = "DOCKBLOXX_STRIPE_KEY";

/// WooCommerce REST API prefix.
pub const WC_API_PATH: &str = "wp-json/wc/v3";

const REDACTED: &str = "********";

/// Full client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DockbloxxConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub stripe: StripeConfig,
}

impl DockbloxxConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, ignoring blank values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_STORE_URL) {
            self.store.base_url = url;
        }
        if let Some(key) = get(ENV_WC_KEY) {
            self.store.consumer_key = key;
        }
        if let Some(secret) = get(ENV_WC_SECRET) {
            self.store.consumer_secret = secret;
        }
        if let Some(key) = get(ENV_STRIPE_KEY) {
            self.stripe.secret_key = key;
        }
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.store.consumer_key = mask(&config.store.consumer_key);
        config.store.consumer_secret = mask(&config.store.consumer_secret);
        config.stripe.secret_key = mask(&config.stripe.secret_key);
        config
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        REDACTED.to_string()
    }
}

/// The `[store]` section: WooCommerce connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Site root, e.g. `https://dockbloxx.com`.
    #[serde(default)]
    pub base_url: String,

    /// REST API consumer key (`ck_...`).
    #[serde(default)]
    pub consumer_key: String,

    /// REST API consumer secret (`cs_...`).
    #[serde(default)]
    pub consumer_secret: String,

    /// Store currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Products per listing page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Per-attempt timeout for store requests.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries for read requests. Writes are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            currency: default_currency(),
            per_page: default_per_page(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl StoreConfig {
    /// The configured currency.
    pub fn currency(&self) -> Result<Currency, FetchError> {
        Currency::from_code(&self.currency)
            .ok_or_else(|| FetchError::Config(format!("unsupported currency {:?}", self.currency)))
    }

    /// Root of the WooCommerce REST API.
    pub fn api_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), WC_API_PATH)
    }

    /// Check that the store can be reached with these settings.
    pub fn validate(&self) -> Result<(), FetchError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(FetchError::Config(format!(
                "store.base_url is not set (or set {})",
                ENV_STORE_URL
            )));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(FetchError::Config(format!(
                "store consumer key and secret are required (or set {} and {})",
                ENV_WC_KEY, ENV_WC_SECRET
            )));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(FetchError::Config(format!(
                "store.per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }
        self.currency().map(|_| ())
    }

    /// Policy for `endpoint` with the configured timeout and retries.
    pub fn policy_for(&self, endpoint: Endpoint) -> FetchPolicy {
        let retries = if endpoint.method().is_idempotent() {
            self.max_retries
        } else {
            0
        };
        FetchPolicy::new(
            Duration::from_millis(self.timeout_ms),
            RetryPolicy::new(retries),
        )
    }
}

/// The `[stripe]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`).
    #[serde(default)]
    pub secret_key: String,

    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base: default_stripe_api_base(),
        }
    }
}

impl StripeConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if !self.is_configured() {
            return Err(FetchError::Config(format!(
                "stripe.secret_key is not set (or set {})",
                ENV_STRIPE_KEY
            )));
        }
        Ok(())
    }
}

//! Endpoint tagging for outbound requests.

use crate::request::Method;
use std::time::Duration;

/// The remote operations the storefront performs.
///
/// Each endpoint carries a default timeout and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET products` listing pages.
    Products,
    /// `GET products/<id>`.
    Product,
    /// `GET products/categories`.
    Categories,
    /// `GET coupons?code=`.
    Coupons,
    /// `POST orders`.
    Orders,
    /// Stripe `POST payment_intents`.
    PaymentIntents,
}

impl Endpoint {
    /// HTTP method used for this endpoint.
    pub fn method(&self) -> Method {
        match self {
            Self::Products | Self::Product | Self::Categories | Self::Coupons => Method::Get,
            Self::Orders | Self::PaymentIntents => Method::Post,
        }
    }

    /// Get the default timeout for this endpoint.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Products | Self::Categories => Duration::from_secs(10),
            Self::Product | Self::Coupons => Duration::from_secs(5),
            Self::Orders | Self::PaymentIntents => Duration::from_secs(20),
        }
    }

    /// Get the default max retries for this endpoint.
    ///
    /// Requests that create resources are never retried.
    pub fn default_max_retries(&self) -> u32 {
        if self.method().is_idempotent() {
            2
        } else {
            0
        }
    }

    /// Get the name of this endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Product => "product",
            Self::Categories => "categories",
            Self::Coupons => "coupons",
            Self::Orders => "orders",
            Self::PaymentIntents => "payment_intents",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_are_not_retried() {
        assert_eq!(Endpoint::Orders.default_max_retries(), 0);
        assert_eq!(Endpoint::PaymentIntents.default_max_retries(), 0);
        assert!(Endpoint::Products.default_max_retries() > 0);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::PaymentIntents.to_string(), "payment_intents");
        assert_eq!(Endpoint::Coupons.method(), Method::Get);
    }
}

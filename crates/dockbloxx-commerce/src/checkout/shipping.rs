//! Shipping method types.

use crate::cart::CartTotals;
use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// WooCommerce shipping method kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingKind {
    FlatRate,
    FreeShipping,
    LocalPickup,
}

impl ShippingKind {
    /// WooCommerce `method_id`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingKind::FlatRate => "flat_rate",
            ShippingKind::FreeShipping => "free_shipping",
            ShippingKind::LocalPickup => "local_pickup",
        }
    }
}

/// A shipping method option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingMethod {
    pub kind: ShippingKind,
    /// Display name.
    pub title: String,
    /// Rate before coupons.
    pub cost: Money,
    /// Subtotal needed to unlock free shipping without a coupon.
    pub min_amount: Option<Money>,
}

impl ShippingMethod {
    pub fn flat_rate(title: impl Into<String>, cost: Money) -> Self {
        Self {
            kind: ShippingKind::FlatRate,
            title: title.into(),
            cost,
            min_amount: None,
        }
    }

    /// Free shipping, unlocked by a coupon or by spending `min_amount`.
    pub fn free_shipping(title: impl Into<String>, min_amount: Option<Money>) -> Self {
        let currency = min_amount.map(|m| m.currency).unwrap_or_default();
        Self {
            kind: ShippingKind::FreeShipping,
            title: title.into(),
            cost: Money::zero(currency),
            min_amount,
        }
    }

    pub fn local_pickup(title: impl Into<String>, cost: Money) -> Self {
        Self {
            kind: ShippingKind::LocalPickup,
            title: title.into(),
            cost,
            min_amount: None,
        }
    }

    /// Whether the shopper may pick this method for the given cart.
    pub fn is_available(&self, totals: &CartTotals) -> bool {
        match self.kind {
            ShippingKind::FreeShipping => {
                totals.free_shipping
                    || self.min_amount.is_some_and(|min| {
                        totals.grand_total.amount_cents >= min.amount_cents
                    })
            }
            ShippingKind::FlatRate | ShippingKind::LocalPickup => true,
        }
    }

    /// Rate charged for the given cart. Free-shipping coupons zero it.
    pub fn rate_for(&self, totals: &CartTotals) -> Money {
        if totals.free_shipping || self.kind == ShippingKind::FreeShipping {
            Money::zero(totals.grand_total.currency)
        } else {
            self.cost
        }
    }
}

/// A selected shipping method with rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingSelection {
    pub method: ShippingMethod,
    /// Rate quoted for the cart at selection time.
    pub rate: Money,
}

impl ShippingSelection {
    /// Create from a shipping method and the cart it applies to.
    pub fn from_method(method: &ShippingMethod, totals: &CartTotals) -> Self {
        Self {
            method: method.clone(),
            rate: method.rate_for(totals),
        }
    }

    pub fn kind(&self) -> ShippingKind {
        self.method.kind
    }

    pub fn title(&self) -> &str {
        &self.method.title
    }

    /// Price the selected method against the cart as it is now.
    ///
    /// Fails when the method no longer qualifies for the cart.
    pub fn repriced(&self, totals: &CartTotals) -> Result<Self, CommerceError> {
        if !self.method.is_available(totals) {
            return Err(CommerceError::CheckoutIncomplete(format!(
                "available shipping method ({} no longer applies)",
                self.method.title
            )));
        }
        Ok(Self::from_method(&self.method, totals))
    }

    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.rate.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn totals(grand: i64, free_shipping: bool) -> CartTotals {
        CartTotals {
            subtotal: usd(grand),
            discount_total: usd(0),
            grand_total: usd(grand),
            item_count: 1,
            coupon_code: None,
            coupon_applicable: free_shipping,
            free_shipping,
            lines: vec![],
        }
    }

    #[test]
    fn test_flat_rate() {
        let method = ShippingMethod::flat_rate("Standard Shipping", usd(599));
        let selection = ShippingSelection::from_method(&method, &totals(2000, false));
        assert_eq!(selection.rate, usd(599));
        assert!(!selection.is_free());
    }

    #[test]
    fn test_free_shipping_coupon_zeroes_rate() {
        let method = ShippingMethod::flat_rate("Standard Shipping", usd(599));
        let selection = ShippingSelection::from_method(&method, &totals(2000, true));
        assert!(selection.is_free());
    }

    #[test]
    fn test_free_shipping_threshold() {
        let method = ShippingMethod::free_shipping("Free Shipping", Some(usd(10000)));
        assert!(!method.is_available(&totals(9999, false)));
        assert!(method.is_available(&totals(10000, false)));
        assert!(method.is_available(&totals(500, true)));
    }

    #[test]
    fn test_repriced_after_coupon_removed() {
        let method = ShippingMethod::flat_rate("Standard Shipping", usd(599));
        let selection = ShippingSelection::from_method(&method, &totals(2000, true));
        assert!(selection.is_free());

        let repriced = selection.repriced(&totals(2000, false)).unwrap();
        assert_eq!(repriced.rate, usd(599));
        assert_eq!(repriced.kind(), ShippingKind::FlatRate);
    }

    #[test]
    fn test_repriced_rejects_unavailable_method() {
        let method = ShippingMethod::free_shipping("Free Shipping", Some(usd(10000)));
        let selection = ShippingSelection::from_method(&method, &totals(12000, false));
        assert!(selection.is_free());

        assert!(matches!(
            selection.repriced(&totals(9000, false)),
            Err(CommerceError::CheckoutIncomplete(_))
        ));
    }
}

//! Cart totals.

use crate::cart::ItemKey;
use crate::money::{Money, BASIS_POINTS};
use serde::{Deserialize, Serialize};

/// Totals derived from the cart contents and the attached coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartTotals {
    /// Subtotal before discounts.
    pub subtotal: Money,
    /// Total coupon discount.
    pub discount_total: Money,
    /// subtotal - discount_total, never negative.
    pub grand_total: Money,
    /// Sum of quantities.
    pub item_count: u32,
    pub coupon_code: Option<String>,
    /// False when a coupon is attached but the cart no longer qualifies.
    pub coupon_applicable: bool,
    /// The attached coupon grants free shipping.
    pub free_shipping: bool,
    /// Per-line breakdown, in cart order.
    pub lines: Vec<LineTotals>,
}

impl CartTotals {
    /// Calculate the savings from discounts.
    pub fn savings(&self) -> Money {
        self.discount_total
    }

    /// Check if any discount is applied.
    pub fn has_discount(&self) -> bool {
        self.discount_total.is_positive()
    }

    /// Discount as basis points of the subtotal.
    pub fn discount_bps(&self) -> i64 {
        if self.subtotal.amount_cents <= 0 {
            return 0;
        }
        let bps = i128::from(self.discount_total.amount_cents) * i128::from(BASIS_POINTS)
            / i128::from(self.subtotal.amount_cents);
        i64::try_from(bps).unwrap_or(BASIS_POINTS)
    }
}

/// Breakdown for a single cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineTotals {
    pub key: ItemKey,
    pub unit_price: Money,
    pub quantity: u32,
    /// unit_price * quantity.
    pub subtotal: Money,
    pub discount: Money,
    /// Final total for this line.
    pub total: Money,
    pub free: bool,
}

impl LineTotals {
    /// Calculate effective unit price after discounts.
    pub fn effective_unit_price(&self) -> Money {
        if self.quantity == 0 {
            return self.unit_price;
        }
        Money::new(
            self.total.amount_cents / i64::from(self.quantity),
            self.total.currency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ProductId;
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[test]
    fn test_discount_bps() {
        let totals = CartTotals {
            subtotal: usd(10000),
            discount_total: usd(1000),
            grand_total: usd(9000),
            item_count: 1,
            coupon_code: Some("SAVE10".into()),
            coupon_applicable: true,
            free_shipping: false,
            lines: vec![],
        };

        assert_eq!(totals.discount_bps(), 1000);
        assert!(totals.has_discount());
    }

    #[test]
    fn test_effective_unit_price() {
        let line = LineTotals {
            key: ItemKey::new(ProductId::new(1), None, &[]),
            unit_price: usd(1000),
            quantity: 2,
            subtotal: usd(2000),
            discount: usd(200),
            total: usd(1800),
            free: false,
        };

        assert_eq!(line.effective_unit_price().amount_cents, 900);
    }
}

//! Coupon discount allocation.
//!
//! Turns a coupon and the current cart lines into a per-line discount.
//! Allocation is deterministic: lines are visited in [`ItemKey`] order, and
//! amounts never exceed the line they are taken from.

use crate::cart::{CartItem, Coupon, CouponRejection, DiscountValue, ItemKey};
use crate::money::{Currency, Money};
use std::collections::BTreeMap;

/// Per-line discounts for one coupon against one cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    discounts: BTreeMap<ItemKey, Money>,
    rejection: Option<CouponRejection>,
}

impl Allocation {
    fn rejected(rejection: CouponRejection) -> Self {
        Self {
            discounts: BTreeMap::new(),
            rejection: Some(rejection),
        }
    }

    /// Discount assigned to a line, if any.
    pub fn discount_for(&self, key: &ItemKey) -> Option<Money> {
        self.discounts.get(key).copied()
    }

    /// Sum of all line discounts.
    pub fn total(&self, currency: Currency) -> Money {
        self.discounts
            .values()
            .fold(Money::zero(currency), |acc, m| acc.saturating_add(m))
    }

    /// Why the coupon does not apply, when it doesn't.
    pub fn rejection(&self) -> Option<&CouponRejection> {
        self.rejection.as_ref()
    }

    pub fn is_applicable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Allocate `coupon` across `items`.
///
/// Checks minimum/maximum spend and eligibility against the current lines;
/// expiry and usage limits are checked once, when the coupon is applied.
pub fn allocate(coupon: &Coupon, items: &[CartItem]) -> Allocation {
    let currency = items
        .first()
        .map(|i| i.unit_price.currency)
        .unwrap_or_default();
    let subtotal = items
        .iter()
        .fold(Money::zero(currency), |acc, i| acc.saturating_add(&i.line_subtotal()));

    if let Err(rejection) = coupon.check_cart(subtotal, !items.is_empty()) {
        return Allocation::rejected(rejection);
    }

    let mut eligible: Vec<&CartItem> = items.iter().filter(|i| coupon.is_eligible(i)).collect();
    eligible.sort_by(|a, b| a.key.cmp(&b.key));
    if eligible.is_empty() {
        return Allocation::rejected(CouponRejection::NoEligibleItems {
            code: coupon.code.clone(),
        });
    }

    let units = discounted_units(&eligible, coupon.limit_usage_to_x_items);

    let mut discounts = BTreeMap::new();
    match coupon.value {
        DiscountValue::Percent { bps } => {
            for item in &eligible {
                let n = units.get(&item.key).copied().unwrap_or(0);
                let amount = item.unit_price.times(n).basis_points(bps);
                discounts.insert(item.key.clone(), amount.min(item.line_subtotal()));
            }
        }
        DiscountValue::FixedProduct { amount } => {
            for item in &eligible {
                let n = units.get(&item.key).copied().unwrap_or(0);
                let per_unit = amount.min(item.unit_price).floor_zero();
                discounts.insert(item.key.clone(), per_unit.times(n));
            }
        }
        DiscountValue::FixedCart { amount } => {
            let bases: Vec<(&ItemKey, i64)> = eligible
                .iter()
                .map(|item| {
                    let n = units.get(&item.key).copied().unwrap_or(0);
                    (&item.key, item.unit_price.times(n).amount_cents.max(0))
                })
                .collect();
            for (key, cents) in split_proportionally(amount.amount_cents.max(0), &bases) {
                discounts.insert(key.clone(), Money::new(cents, currency));
            }
        }
    }

    discounts.retain(|_, m| m.is_positive());
    Allocation {
        discounts,
        rejection: None,
    }
}

/// Units per line that receive the discount.
///
/// Without a limit every unit counts. With one, the most expensive units are
/// taken first and ties go to the smaller key.
fn discounted_units(eligible: &[&CartItem], limit: Option<u32>) -> BTreeMap<ItemKey, u32> {
    let Some(limit) = limit.filter(|l| *l > 0) else {
        return eligible
            .iter()
            .map(|i| (i.key.clone(), i.quantity))
            .collect();
    };

    let mut by_price: Vec<&&CartItem> = eligible.iter().collect();
    by_price.sort_by(|a, b| {
        b.unit_price
            .amount_cents
            .cmp(&a.unit_price.amount_cents)
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut remaining = limit;
    let mut units = BTreeMap::new();
    for item in by_price {
        let take = item.quantity.min(remaining);
        units.insert(item.key.clone(), take);
        remaining -= take;
    }
    units
}

/// Split `total` across `bases` in proportion, capped at the base sum.
///
/// Shares are floored and leftover cents go one at a time to lines in the
/// given order, skipping lines already fully discounted.
fn split_proportionally<'a>(total: i64, bases: &[(&'a ItemKey, i64)]) -> Vec<(&'a ItemKey, i64)> {
    let base_sum: i128 = bases.iter().map(|(_, b)| i128::from(*b)).sum();
    if base_sum == 0 {
        return Vec::new();
    }
    let total = i128::from(total).min(base_sum);

    let mut shares: Vec<(&ItemKey, i128, i128)> = bases
        .iter()
        .map(|(key, base)| {
            let base = i128::from(*base);
            (*key, total * base / base_sum, base)
        })
        .collect();

    let mut leftover = total - shares.iter().map(|(_, s, _)| s).sum::<i128>();
    while leftover > 0 {
        let mut progressed = false;
        for (_, share, base) in shares.iter_mut() {
            if leftover == 0 {
                break;
            }
            if *share < *base {
                *share += 1;
                leftover -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    shares
        .into_iter()
        .map(|(key, share, _)| (key, i64::try_from(share).unwrap_or(i64::MAX)))
        .collect()
}

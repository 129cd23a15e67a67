//! Coupon types.
//!
//! A [`Coupon`] is a snapshot of a store coupon taken when the shopper
//! redeems a code. The cart keeps the snapshot and re-evaluates it after
//! every change, so the numbers shown always agree with the items present.

use crate::cart::{CartItem, CartStore};
use crate::error::ApiError;
use crate::ids::{CategoryId, CouponId, ProductId};
use crate::money::{Currency, Money, BASIS_POINTS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a coupon reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Fixed amount off the eligible subtotal, spread across lines.
    FixedCart,
    /// Percentage off each eligible line.
    Percent,
    /// Fixed amount off each eligible unit.
    FixedProduct,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::FixedCart => "fixed_cart",
            DiscountType::Percent => "percent",
            DiscountType::FixedProduct => "fixed_product",
        }
    }

    /// Parse the WooCommerce `discount_type` field.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed_cart" => Some(DiscountType::FixedCart),
            "percent" => Some(DiscountType::Percent),
            "fixed_product" => Some(DiscountType::FixedProduct),
            _ => None,
        }
    }
}

/// Value of a coupon, typed by its discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Basis points off (1000 = 10%).
    Percent { bps: i64 },
    /// Amount off the eligible subtotal.
    FixedCart { amount: Money },
    /// Amount off each eligible unit.
    FixedProduct { amount: Money },
}

impl DiscountValue {
    pub fn discount_type(&self) -> DiscountType {
        match self {
            DiscountValue::Percent { .. } => DiscountType::Percent,
            DiscountValue::FixedCart { .. } => DiscountType::FixedCart,
            DiscountValue::FixedProduct { .. } => DiscountType::FixedProduct,
        }
    }

    /// Short label for display (e.g., "15% off", "$10.00 off").
    pub fn label(&self) -> String {
        match self {
            DiscountValue::Percent { bps } => {
                let whole = bps / 100;
                let frac = bps % 100;
                if frac == 0 {
                    format!("{}% off", whole)
                } else {
                    format!("{}.{:02}% off", whole, frac)
                }
            }
            DiscountValue::FixedCart { amount } => format!("{} off", amount.display()),
            DiscountValue::FixedProduct { amount } => format!("{} off each", amount.display()),
        }
    }

    fn currency(&self) -> Option<Currency> {
        match self {
            DiscountValue::Percent { .. } => None,
            DiscountValue::FixedCart { amount } | DiscountValue::FixedProduct { amount } => {
                Some(amount.currency)
            }
        }
    }
}

/// A redeemable coupon snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    pub id: CouponId,
    /// Code as the shopper typed it (matching is case-insensitive).
    pub code: String,
    pub description: String,
    pub value: DiscountValue,
    /// Grants free shipping at checkout.
    pub free_shipping: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: u32,
    /// Maximum number of redemptions (None = unlimited).
    pub usage_limit: Option<u32>,
    pub minimum_spend: Option<Money>,
    pub maximum_spend: Option<Money>,
    /// Products (or variations) the coupon is limited to. Empty means all.
    pub product_ids: Vec<ProductId>,
    pub excluded_product_ids: Vec<ProductId>,
    /// Categories the coupon is limited to. Empty means all.
    pub category_ids: Vec<CategoryId>,
    pub excluded_category_ids: Vec<CategoryId>,
    /// Skip items that are already on sale.
    pub exclude_sale_items: bool,
    /// Maximum number of units discounted, most expensive first.
    pub limit_usage_to_x_items: Option<u32>,
}

impl Coupon {
    fn with_value(code: impl Into<String>, value: DiscountValue) -> Self {
        Self {
            id: CouponId::default(),
            code: code.into(),
            description: String::new(),
            value,
            free_shipping: false,
            expires_at: None,
            usage_count: 0,
            usage_limit: None,
            minimum_spend: None,
            maximum_spend: None,
            product_ids: Vec::new(),
            excluded_product_ids: Vec::new(),
            category_ids: Vec::new(),
            excluded_category_ids: Vec::new(),
            exclude_sale_items: false,
            limit_usage_to_x_items: None,
        }
    }

    /// Create a percentage coupon. `bps` is clamped to 0..=100%.
    pub fn percent(code: impl Into<String>, bps: i64) -> Self {
        Self::with_value(
            code,
            DiscountValue::Percent {
                bps: bps.clamp(0, BASIS_POINTS),
            },
        )
    }

    /// Create a fixed cart coupon.
    pub fn fixed_cart(code: impl Into<String>, amount: Money) -> Self {
        Self::with_value(code, DiscountValue::FixedCart { amount })
    }

    /// Create a fixed per-unit coupon.
    pub fn fixed_product(code: impl Into<String>, amount: Money) -> Self {
        Self::with_value(code, DiscountValue::FixedProduct { amount })
    }

    pub fn with_id(mut self, id: CouponId) -> Self {
        self.id = id;
        self
    }

    pub fn with_minimum_spend(mut self, amount: Money) -> Self {
        self.minimum_spend = Some(amount);
        self
    }

    pub fn with_maximum_spend(mut self, amount: Money) -> Self {
        self.maximum_spend = Some(amount);
        self
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn with_products(mut self, ids: impl IntoIterator<Item = ProductId>) -> Self {
        self.product_ids = ids.into_iter().collect();
        self
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids = ids.into_iter().collect();
        self
    }

    pub fn with_free_shipping(mut self) -> Self {
        self.free_shipping = true;
        self
    }

    pub fn with_item_limit(mut self, limit: u32) -> Self {
        self.limit_usage_to_x_items = Some(limit);
        self
    }

    pub fn excluding_sale_items(mut self) -> Self {
        self.exclude_sale_items = true;
        self
    }

    /// Set expiration date.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn discount_type(&self) -> DiscountType {
        self.value.discount_type()
    }

    /// Case-insensitive code comparison.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// Check if coupon has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Check if coupon has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Checks that do not depend on cart contents.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if self.is_expired_at(now) {
            return Err(CouponRejection::Expired {
                code: self.code.clone(),
            });
        }
        if self.is_exhausted() {
            return Err(CouponRejection::UsageLimitReached {
                code: self.code.clone(),
            });
        }
        Ok(())
    }

    /// Checks against the cart subtotal and currency.
    pub(crate) fn check_cart(
        &self,
        subtotal: Money,
        has_items: bool,
    ) -> Result<(), CouponRejection> {
        if !has_items {
            return Err(CouponRejection::EmptyCart);
        }
        if let Some(currency) = self.value.currency() {
            if currency != subtotal.currency {
                return Err(CouponRejection::CurrencyMismatch {
                    code: self.code.clone(),
                    expected: subtotal.currency,
                    got: currency,
                });
            }
        }
        if let Some(minimum) = self.minimum_spend {
            if minimum.is_positive() && subtotal.amount_cents < minimum.amount_cents {
                return Err(CouponRejection::MinimumSpend {
                    code: self.code.clone(),
                    minimum,
                    subtotal,
                });
            }
        }
        if let Some(maximum) = self.maximum_spend {
            if maximum.is_positive() && subtotal.amount_cents > maximum.amount_cents {
                return Err(CouponRejection::MaximumSpend {
                    code: self.code.clone(),
                    maximum,
                    subtotal,
                });
            }
        }
        Ok(())
    }

    /// Whether a cart item is covered by this coupon's product rules.
    pub fn is_eligible(&self, item: &CartItem) -> bool {
        let matches_product = |ids: &[ProductId]| {
            ids.iter().any(|id| {
                *id == item.product_id
                    || item.variation_id.is_some_and(|v| v.get() == id.get())
            })
        };
        let matches_category = |ids: &[CategoryId]| {
            item.categories.iter().any(|c| ids.contains(&c.id))
        };

        if self.exclude_sale_items && item.on_sale {
            return false;
        }
        if matches_product(&self.excluded_product_ids) {
            return false;
        }
        if matches_category(&self.excluded_category_ids) {
            return false;
        }
        if !self.product_ids.is_empty() && !matches_product(&self.product_ids) {
            return false;
        }
        if !self.category_ids.is_empty() && !matches_category(&self.category_ids) {
            return false;
        }
        true
    }
}

/// Reasons a coupon does not apply to the current cart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("Coupon {code} has expired")]
    Expired { code: String },

    #[error("Coupon {code} has reached its usage limit")]
    UsageLimitReached { code: String },

    #[error("Coupon {code} requires a minimum spend of {minimum} (cart subtotal is {subtotal})")]
    MinimumSpend {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    #[error("Coupon {code} allows a maximum spend of {maximum} (cart subtotal is {subtotal})")]
    MaximumSpend {
        code: String,
        maximum: Money,
        subtotal: Money,
    },

    #[error("Coupon {code} does not apply to any item in the cart")]
    NoEligibleItems { code: String },

    #[error("Coupons cannot be applied to an empty cart")]
    EmptyCart,

    #[error("Coupon {code} is in {got}, cart is in {expected}")]
    CurrencyMismatch {
        code: String,
        expected: Currency,
        got: Currency,
    },
}

/// Failures when redeeming a coupon code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("Please enter a coupon code")]
    EmptyCode,

    #[error("Coupon {0:?} does not exist")]
    NotFound(String),

    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    #[error("Coupon lookup failed: {0}")]
    Api(ApiError),
}

/// Looks up coupons by code.
#[async_trait]
pub trait CouponLookup: Send + Sync {
    /// Find a coupon by its code. Unknown codes yield `ApiError::NotFound`.
    async fn find_coupon(&self, code: &str) -> Result<Coupon, ApiError>;
}

/// Look up `code` and attach it to `cart`.
///
/// The cart is left untouched unless the coupon is found and accepted.
pub async fn redeem_coupon(
    cart: &mut CartStore,
    lookup: &dyn CouponLookup,
    code: &str,
) -> Result<(), CouponError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CouponError::EmptyCode);
    }

    let coupon = match lookup.find_coupon(code).await {
        Ok(coupon) => coupon,
        Err(ApiError::NotFound(_)) => return Err(CouponError::NotFound(code.to_string())),
        Err(e) => return Err(CouponError::Api(e)),
    };

    cart.apply_coupon(coupon)?;
    Ok(())
}

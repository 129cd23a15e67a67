//! The cart store.
//!
//! [`CartStore`] owns the shopper's lines, the attached coupon and the
//! drawer visibility flag. Every mutation re-runs coupon allocation before
//! returning, so readers never see totals that disagree with the items.

use crate::cart::discount::allocate;
use crate::cart::{CartTotals, Coupon, CouponRejection, ItemKey, LineTotals};
use crate::catalog::{CategoryRef, VariantOption};
use crate::error::CommerceError;
use crate::ids::{ProductId, VariationId};
use crate::money::{Currency, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: u32 = 9999;

/// What the storefront hands the cart when the shopper clicks "add".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItemInput {
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    /// Selected options (e.g., Length: 48in).
    pub options: Vec<VariantOption>,
    /// Display name.
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// Thumbnail URL.
    pub image: Option<String>,
    pub categories: Vec<CategoryRef>,
    pub on_sale: bool,
}

impl CartItemInput {
    /// Identity key this input resolves to.
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product_id, self.variation_id, &self.options)
    }
}

/// A line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub key: ItemKey,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub options: Vec<VariantOption>,
    pub name: String,
    pub image: Option<String>,
    pub categories: Vec<CategoryRef>,
    pub unit_price: Money,
    pub quantity: u32,
    pub on_sale: bool,
    /// Coupon discount currently assigned to this line.
    pub discount: Money,
    /// Whether the coupon makes this line free.
    pub free: bool,
}

impl CartItem {
    fn from_input(key: ItemKey, input: CartItemInput) -> Self {
        let currency = input.unit_price.currency;
        Self {
            key,
            product_id: input.product_id,
            variation_id: input.variation_id,
            options: input.options,
            name: input.name,
            image: input.image,
            categories: input.categories,
            unit_price: input.unit_price,
            quantity: input.quantity,
            on_sale: input.on_sale,
            discount: Money::zero(currency),
            free: false,
        }
    }

    /// unit_price * quantity.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Line subtotal after the coupon discount.
    pub fn line_total(&self) -> Money {
        self.line_subtotal().saturating_sub(&self.discount).floor_zero()
    }

    /// Convert back into an input (used for snapshots).
    pub fn to_input(&self) -> CartItemInput {
        CartItemInput {
            product_id: self.product_id,
            variation_id: self.variation_id,
            options: self.options.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            image: self.image.clone(),
            categories: self.categories.clone(),
            on_sale: self.on_sale,
        }
    }
}

/// Serializable cart contents, e.g. for local storage.
///
/// Discount annotations are not stored; they are recomputed on restore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSnapshot {
    pub currency: Currency,
    pub items: Vec<CartItemInput>,
    pub coupon: Option<Coupon>,
    #[serde(default)]
    pub is_open: bool,
}

/// The shopper's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartStore {
    currency: Currency,
    items: Vec<CartItem>,
    coupon: Option<Coupon>,
    coupon_applicable: bool,
    is_open: bool,
}

impl CartStore {
    /// Create an empty, closed cart.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: Vec::new(),
            coupon: None,
            coupon_applicable: false,
            is_open: false,
        }
    }

    /// Rebuild a cart from a snapshot.
    ///
    /// Lines sharing a key are merged; the coupon is re-attached without
    /// re-checking expiry, as it was accepted when first applied.
    pub fn restore(snapshot: CartSnapshot) -> Result<Self, CommerceError> {
        let mut store = Self::new(snapshot.currency);
        for input in snapshot.items {
            store.insert(input)?;
        }
        store.coupon = snapshot.coupon;
        store.is_open = snapshot.is_open;
        store.recompute();
        Ok(store)
    }

    /// Capture the cart for persistence.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            currency: self.currency,
            items: self.items.iter().map(CartItem::to_input).collect(),
            coupon: self.coupon.clone(),
            is_open: self.is_open,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Add an item to the cart.
    ///
    /// An existing line with the same key has its quantity increased.
    ///
    /// Returns an error if:
    /// - Quantity is zero
    /// - The resulting quantity would exceed MAX_QUANTITY_PER_ITEM
    /// - The price is in another currency
    pub fn add_item(&mut self, input: CartItemInput) -> Result<ItemKey, CommerceError> {
        let key = self.insert(input)?;
        self.recompute();
        Ok(key)
    }

    fn insert(&mut self, input: CartItemInput) -> Result<ItemKey, CommerceError> {
        if input.quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }
        if input.unit_price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: input.unit_price.currency.code().to_string(),
            });
        }

        let key = input.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key == key) {
            let new_quantity = existing.quantity.saturating_add(input.quantity);
            if new_quantity > MAX_QUANTITY_PER_ITEM {
                return Err(CommerceError::QuantityExceedsLimit(
                    new_quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            existing.quantity = new_quantity;
            debug!(key = %key, quantity = new_quantity, "Increased cart line");
            return Ok(key);
        }

        if input.quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                input.quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        debug!(key = %key, quantity = input.quantity, "Added cart line");
        self.items.push(CartItem::from_input(key.clone(), input));
        Ok(key)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns whether a line was found.
    pub fn update_quantity(&mut self, key: &ItemKey, quantity: u32) -> Result<bool, CommerceError> {
        if quantity == 0 {
            return Ok(self.remove_item(key));
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        let Some(item) = self.items.iter_mut().find(|i| &i.key == key) else {
            return Ok(false);
        };
        item.quantity = quantity;
        debug!(key = %key, quantity, "Updated cart line");
        self.recompute();
        Ok(true)
    }

    /// Take one unit off a line, removing it at zero.
    pub fn decrement(&mut self, key: &ItemKey) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| &i.key == key) else {
            return false;
        };
        if item.quantity <= 1 {
            return self.remove_item(key);
        }
        item.quantity -= 1;
        self.recompute();
        true
    }

    /// Remove a line from the cart.
    pub fn remove_item(&mut self, key: &ItemKey) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.key != key);
        let removed = self.items.len() < len_before;
        if removed {
            debug!(key = %key, "Removed cart line");
            self.recompute();
        }
        removed
    }

    /// Remove every line and detach the coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.recompute();
    }

    /// Back to a fresh, closed cart (e.g., after an order is placed).
    pub fn reset(&mut self) {
        *self = Self::new(self.currency);
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Show or hide the cart drawer.
    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    pub fn toggle_open(&mut self) -> bool {
        self.is_open = !self.is_open;
        self.is_open
    }

    /// Apply a coupon, replacing any previous one.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), CouponRejection> {
        self.apply_coupon_at(coupon, Utc::now())
    }

    /// Apply a coupon as of `now`.
    ///
    /// On rejection the cart is unchanged.
    pub fn apply_coupon_at(
        &mut self,
        coupon: Coupon,
        now: DateTime<Utc>,
    ) -> Result<(), CouponRejection> {
        let checked = coupon
            .check_redeemable(now)
            .and_then(|()| match allocate(&coupon, &self.items).rejection() {
                Some(rejection) => Err(rejection.clone()),
                None => Ok(()),
            });
        if let Err(rejection) = checked {
            warn!(code = %coupon.code, reason = %rejection, "Coupon rejected");
            return Err(rejection);
        }

        info!(code = %coupon.code, kind = coupon.discount_type().as_str(), "Coupon applied");
        self.coupon = Some(coupon);
        self.recompute();
        Ok(())
    }

    /// Detach the coupon.
    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        let removed = self.coupon.take();
        if removed.is_some() {
            self.recompute();
        }
        removed
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Whether the attached coupon currently discounts anything.
    pub fn coupon_applicable(&self) -> bool {
        self.coupon_applicable
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Get a line by key.
    pub fn get_item(&self, key: &ItemKey) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Get number of distinct lines.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current totals.
    pub fn totals(&self) -> CartTotals {
        let lines: Vec<LineTotals> = self
            .items
            .iter()
            .map(|item| LineTotals {
                key: item.key.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.line_subtotal(),
                discount: item.discount,
                total: item.line_total(),
                free: item.free,
            })
            .collect();

        let zero = Money::zero(self.currency);
        let subtotal = lines
            .iter()
            .fold(zero, |acc, l| acc.saturating_add(&l.subtotal));
        let discount_total = lines
            .iter()
            .fold(zero, |acc, l| acc.saturating_add(&l.discount));
        let grand_total = subtotal.saturating_sub(&discount_total).floor_zero();

        CartTotals {
            subtotal,
            discount_total,
            grand_total,
            item_count: self.item_count(),
            coupon_code: self.coupon.as_ref().map(|c| c.code.clone()),
            coupon_applicable: self.coupon_applicable,
            free_shipping: self.coupon_applicable
                && self.coupon.as_ref().is_some_and(|c| c.free_shipping),
            lines,
        }
    }

    fn recompute(&mut self) {
        let allocation = self.coupon.as_ref().map(|c| allocate(c, &self.items));
        self.coupon_applicable = allocation.as_ref().is_some_and(|a| a.is_applicable());

        for item in &mut self.items {
            let discount = allocation
                .as_ref()
                .and_then(|a| a.discount_for(&item.key))
                .unwrap_or(Money::zero(self.currency));
            item.discount = discount;
            item.free = discount.is_positive() && discount == item.line_subtotal();
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(Currency::USD)
    }
}

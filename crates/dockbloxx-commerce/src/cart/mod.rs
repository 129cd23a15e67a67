//! Shopping cart module.
//!
//! Contains the cart store, identity keys, coupons, discount allocation,
//! and totals.

mod coupon;
mod discount;
mod key;
mod pricing;
mod store;

pub use coupon::{
    redeem_coupon, Coupon, CouponError, CouponLookup, CouponRejection, DiscountType, DiscountValue,
};
pub use discount::{allocate, Allocation};
pub use key::ItemKey;
pub use pricing::{CartTotals, LineTotals};
pub use store::{CartItem, CartItemInput, CartSnapshot, CartStore, MAX_QUANTITY_PER_ITEM};

//! Checkout module.
//!
//! Contains the checkout flow, addresses, shipping, orders, payment
//! intents, and the service that places orders.

mod address;
mod flow;
mod order;
mod payment;
mod service;
mod shipping;

pub use address::Address;
pub use flow::{CheckoutFlow, CheckoutStep, CHECKOUT_TTL_MINUTES};
pub use order::{
    CouponLine, MetaData, OrderLine, OrderPayload, OrderReceipt, OrderStatus, ShippingLine,
    PAYMENT_INTENT_META_KEY, STRIPE_GATEWAY,
};
pub use payment::{PaymentIntent, PaymentIntentRequest, PaymentIntentStatus};
pub use service::{Checkout, CheckoutError, CheckoutOutcome, OrderApi, PaymentApi};
pub use shipping::{ShippingKind, ShippingMethod, ShippingSelection};

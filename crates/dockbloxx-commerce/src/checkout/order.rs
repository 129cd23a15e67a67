//! Order types.
//!
//! [`OrderPayload`] is the body of a WooCommerce `POST orders` request,
//! built from the cart and the checkout details. [`OrderReceipt`] is what
//! the store hands back.

use crate::cart::CartStore;
use crate::checkout::{Address, CheckoutFlow};
use crate::error::CommerceError;
use crate::ids::{OrderId, ProductId, VariationId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Payment gateway id registered in WooCommerce for Stripe.
pub const STRIPE_GATEWAY: &str = "stripe";

/// Meta key linking an order to its Stripe payment intent.
pub const PAYMENT_INTENT_META_KEY: &str = "_stripe_intent_id";

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Order placed, awaiting payment.
    #[default]
    Pending,
    /// Payment received, order being prepared.
    Processing,
    /// Awaiting manual confirmation.
    OnHold,
    /// Order fulfilled.
    Completed,
    /// Order cancelled.
    Cancelled,
    /// Order refunded.
    Refunded,
    /// Payment failed.
    Failed,
    /// Created by the block checkout, not yet submitted.
    CheckoutDraft,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
            OrderStatus::CheckoutDraft => "checkout-draft",
        }
    }

    /// Parse the WooCommerce `status` field.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "on-hold" => Some(OrderStatus::OnHold),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            "failed" => Some(OrderStatus::Failed),
            "checkout-draft" => Some(OrderStatus::CheckoutDraft),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending payment",
            OrderStatus::Processing => "Processing",
            OrderStatus::OnHold => "On hold",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Failed => "Failed",
            OrderStatus::CheckoutDraft => "Draft",
        }
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

/// A line in the order request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<VariationId>,
    pub quantity: u32,
    /// Selected options, echoed so they show on the order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<MetaData>,
}

/// Shipping charge on the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingLine {
    pub method_id: String,
    pub method_title: String,
    /// Decimal amount (e.g., "5.99").
    pub total: String,
}

/// Coupon redeemed on the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CouponLine {
    pub code: String,
}

/// A WooCommerce meta entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaData {
    pub key: String,
    pub value: String,
}

impl MetaData {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Body of a create-order request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayload {
    pub payment_method: String,
    pub payment_method_title: String,
    /// Payment is confirmed by the gateway webhook, not at creation.
    pub set_paid: bool,
    pub billing: Address,
    pub shipping: Address,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_note: String,
    pub line_items: Vec<OrderLine>,
    pub shipping_lines: Vec<ShippingLine>,
    pub coupon_lines: Vec<CouponLine>,
    pub meta_data: Vec<MetaData>,
}

impl OrderPayload {
    /// Build the order request for `cart` using the details in `flow`.
    ///
    /// A coupon that no longer applies to the cart is left off the order.
    pub fn from_cart(cart: &CartStore, flow: &CheckoutFlow) -> Result<Self, CommerceError> {
        if cart.is_empty() {
            return Err(CommerceError::CheckoutIncomplete("cart items".to_string()));
        }
        let billing = flow
            .billing
            .as_ref()
            .filter(|b| b.is_complete_billing())
            .ok_or_else(|| CommerceError::CheckoutIncomplete("billing details".to_string()))?;
        let shipping = flow
            .effective_shipping_address()
            .filter(|s| s.is_complete())
            .ok_or_else(|| CommerceError::CheckoutIncomplete("shipping address".to_string()))?;
        let method = flow
            .shipping_method
            .as_ref()
            .ok_or_else(|| CommerceError::CheckoutIncomplete("shipping method".to_string()))?
            .repriced(&cart.totals())?;

        let line_items = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                variation_id: item.variation_id,
                quantity: item.quantity,
                meta_data: item
                    .options
                    .iter()
                    .map(|o| MetaData::new(o.name.clone(), o.value.clone()))
                    .collect(),
            })
            .collect();

        let coupon_lines = cart
            .coupon()
            .filter(|_| cart.coupon_applicable())
            .map(|c| CouponLine {
                code: c.code.trim().to_lowercase(),
            })
            .into_iter()
            .collect();

        let meta_data = flow
            .payment_intent_id
            .iter()
            .map(|id| MetaData::new(PAYMENT_INTENT_META_KEY, id.clone()))
            .collect();

        Ok(Self {
            payment_method: STRIPE_GATEWAY.to_string(),
            payment_method_title: "Credit Card (Stripe)".to_string(),
            set_paid: false,
            billing: billing.clone(),
            shipping: shipping.as_shipping(),
            customer_note: flow.customer_note.clone().unwrap_or_default(),
            line_items,
            shipping_lines: vec![ShippingLine {
                method_id: method.kind().as_str().to_string(),
                method_title: method.title().to_string(),
                total: method.rate.display_amount(),
            }],
            coupon_lines,
            meta_data,
        })
    }

    /// Total units ordered.
    pub fn item_count(&self) -> u32 {
        self.line_items
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }
}

/// The store's answer to a create-order request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Key used in order-received URLs.
    pub order_key: String,
    pub total: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Coupon;
    use crate::catalog::fixtures::product;
    use crate::checkout::{ShippingMethod, ShippingSelection};
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn ready_flow() -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.set_billing(
            Address::new("Jane", "Smith", "456 Oak Ave", "Tampa", "FL", "33602", "US")
                .with_email("jane@example.com"),
        );
        flow.set_shipping_method(ShippingSelection {
            method: ShippingMethod::flat_rate("Standard", usd(599)),
            rate: usd(599),
        });
        flow.set_payment_intent("pi_123");
        flow
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!(OrderStatus::parse("on-hold"), Some(OrderStatus::OnHold));
        assert_eq!(OrderStatus::OnHold.as_str(), "on-hold");
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_payload_from_cart() {
        let mut cart = CartStore::default();
        cart.add_item(product(7, 2500, "accessories").to_cart_input(2))
            .unwrap();
        cart.apply_coupon(Coupon::percent("Summer15", 1500)).unwrap();

        let payload = OrderPayload::from_cart(&cart, &ready_flow()).unwrap();
        assert_eq!(payload.item_count(), 2);
        assert_eq!(payload.line_items[0].product_id, ProductId::new(7));
        assert_eq!(payload.coupon_lines, vec![CouponLine { code: "summer15".into() }]);
        assert_eq!(payload.shipping_lines[0].method_id, "flat_rate");
        assert_eq!(payload.shipping_lines[0].total, "5.99");
        assert_eq!(payload.meta_data[0].value, "pi_123");
        assert!(payload.shipping.email.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["line_items"][0].get("variation_id").is_none());
        assert_eq!(json["billing"]["email"], "jane@example.com");
    }

    #[test]
    fn test_payload_requires_details() {
        let cart = CartStore::default();
        assert_eq!(
            OrderPayload::from_cart(&cart, &ready_flow()),
            Err(CommerceError::CheckoutIncomplete("cart items".into()))
        );

        let mut cart = CartStore::default();
        cart.add_item(product(7, 2500, "accessories").to_cart_input(1))
            .unwrap();
        assert_eq!(
            OrderPayload::from_cart(&cart, &CheckoutFlow::new()),
            Err(CommerceError::CheckoutIncomplete("billing details".into()))
        );
    }
}

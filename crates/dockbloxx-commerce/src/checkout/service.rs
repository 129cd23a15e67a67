//! Placing orders.
//!
//! [`Checkout`] drives the two network calls behind the "Place order"
//! button: create a payment intent for the amount due, then create the
//! order in the store referencing that intent.

use crate::cart::CartStore;
use crate::checkout::{
    CheckoutFlow, CheckoutStep, OrderPayload, OrderReceipt, PaymentIntent, PaymentIntentRequest,
};
use crate::error::{ApiError, CommerceError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Creates orders in the store.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, order: &OrderPayload) -> Result<OrderReceipt, ApiError>;
}

/// Creates payment intents with the payment provider.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError>;
}

/// Errors from placing an order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Invalid(#[from] CommerceError),

    #[error("Payment could not be started: {0}")]
    Payment(ApiError),

    #[error("Order could not be created: {0}")]
    Order(ApiError),
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub order: OrderReceipt,
    pub payment: PaymentIntent,
}

/// Checkout service over the order and payment APIs.
#[derive(Clone)]
pub struct Checkout {
    orders: Arc<dyn OrderApi>,
    payments: Arc<dyn PaymentApi>,
}

impl Checkout {
    pub fn new(orders: Arc<dyn OrderApi>, payments: Arc<dyn PaymentApi>) -> Self {
        Self { orders, payments }
    }

    /// Create the payment intent, then the order.
    ///
    /// Nothing is sent when the cart is empty or details are missing. On
    /// success the cart is reset and the flow marked complete; on failure
    /// both are left as they were, apart from the intent id once created.
    pub async fn place_order(
        &self,
        cart: &mut CartStore,
        flow: &mut CheckoutFlow,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let missing = flow.missing_for_step(CheckoutStep::Payment);
        if !missing.is_empty() {
            return Err(CommerceError::CheckoutIncomplete(missing.join(", ")).into());
        }

        let request = PaymentIntentRequest::for_order(&cart.totals(), flow)?;
        // Validate the order body before any money moves.
        OrderPayload::from_cart(cart, flow)?;

        let payment = self
            .payments
            .create_payment_intent(&request)
            .await
            .map_err(|e| {
                warn!(error = %e, "Payment intent failed");
                CheckoutError::Payment(e)
            })?;
        flow.set_payment_intent(payment.id.clone());

        let payload = OrderPayload::from_cart(cart, flow)?;
        let order = self.orders.create_order(&payload).await.map_err(|e| {
            warn!(error = %e, intent = %payment.id, "Order creation failed");
            CheckoutError::Order(e)
        })?;

        info!(order = %order.id, status = order.status.as_str(), "Order placed");
        flow.mark_complete();
        cart.reset();

        Ok(CheckoutOutcome { order, payment })
    }
}

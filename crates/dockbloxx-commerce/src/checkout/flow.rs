//! Checkout flow state machine.

use crate::checkout::{Address, ShippingSelection};
use crate::CommerceError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an idle checkout stays valid.
pub const CHECKOUT_TTL_MINUTES: i64 = 60;

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Cart review.
    Cart,
    /// Contact and billing details.
    Information,
    /// Shipping address and method.
    Shipping,
    /// Payment details.
    Payment,
    /// Order review before submission.
    Review,
    /// Checkout complete.
    Complete,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Cart => "cart",
            CheckoutStep::Information => "information",
            CheckoutStep::Shipping => "shipping",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Review => "review",
            CheckoutStep::Complete => "complete",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::Cart => "Cart",
            CheckoutStep::Information => "Information",
            CheckoutStep::Shipping => "Shipping",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Review => "Review",
            CheckoutStep::Complete => "Complete",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Cart => 1,
            CheckoutStep::Information => 2,
            CheckoutStep::Shipping => 3,
            CheckoutStep::Payment => 4,
            CheckoutStep::Review => 5,
            CheckoutStep::Complete => 6,
        }
    }

    fn next(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Cart => Some(CheckoutStep::Information),
            CheckoutStep::Information => Some(CheckoutStep::Shipping),
            CheckoutStep::Shipping => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
            CheckoutStep::Review => Some(CheckoutStep::Complete),
            CheckoutStep::Complete => None,
        }
    }

    fn previous(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Cart => None,
            CheckoutStep::Information => Some(CheckoutStep::Cart),
            CheckoutStep::Shipping => Some(CheckoutStep::Information),
            CheckoutStep::Payment => Some(CheckoutStep::Shipping),
            CheckoutStep::Review => Some(CheckoutStep::Payment),
            CheckoutStep::Complete => Some(CheckoutStep::Review),
        }
    }
}

/// Checkout flow state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutFlow {
    /// Current step.
    pub step: CheckoutStep,
    /// Completed steps.
    pub completed_steps: Vec<CheckoutStep>,
    /// Billing address, including the customer email.
    pub billing: Option<Address>,
    /// Shipping address (if different from billing).
    pub shipping: Option<Address>,
    /// Ship to the billing address.
    pub ship_to_billing: bool,
    /// Selected shipping method.
    pub shipping_method: Option<ShippingSelection>,
    /// Stripe payment intent backing this checkout.
    pub payment_intent_id: Option<String>,
    /// Note from the customer.
    pub customer_note: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CheckoutFlow {
    /// Create a new checkout flow.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            step: CheckoutStep::Cart,
            completed_steps: Vec::new(),
            billing: None,
            shipping: None,
            ship_to_billing: true,
            shipping_method: None,
            payment_intent_id: None,
            customer_note: None,
            updated_at: now,
            expires_at: now + Duration::minutes(CHECKOUT_TTL_MINUTES),
        }
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = now;
        self.expires_at = now + Duration::minutes(CHECKOUT_TTL_MINUTES);
    }

    /// Check if checkout can advance to a step.
    pub fn can_advance_to(&self, step: CheckoutStep) -> bool {
        self.missing_for_step(step).is_empty()
    }

    /// Advance to the next step.
    pub fn advance(&mut self) -> Result<CheckoutStep, CommerceError> {
        let Some(next) = self.step.next() else {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: "none".to_string(),
            });
        };

        let missing = self.missing_for_step(next);
        if !missing.is_empty() {
            return Err(CommerceError::CheckoutIncomplete(missing.join(", ")));
        }

        if !self.completed_steps.contains(&self.step) {
            self.completed_steps.push(self.step);
        }
        self.step = next;
        self.touch();

        Ok(next)
    }

    /// Go back to a previous step.
    pub fn go_back(&mut self) -> Result<CheckoutStep, CommerceError> {
        let Some(prev) = self.step.previous() else {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: "none".to_string(),
            });
        };

        self.step = prev;
        self.touch();

        Ok(prev)
    }

    /// Go to a specific step (if allowed).
    pub fn go_to(&mut self, step: CheckoutStep) -> Result<(), CommerceError> {
        // Can go back to any completed step or the current step
        if step == self.step || self.completed_steps.contains(&step) {
            self.step = step;
            self.touch();
            Ok(())
        } else if self.step.next() == Some(step) && self.can_advance_to(step) {
            self.advance()?;
            Ok(())
        } else {
            Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: step.as_str().to_string(),
            })
        }
    }

    /// What is still missing before `step` can be entered.
    pub fn missing_for_step(&self, step: CheckoutStep) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if step.number() >= CheckoutStep::Shipping.number()
            && !self.billing.as_ref().is_some_and(Address::is_complete_billing)
        {
            missing.push("billing details");
        }
        if step.number() >= CheckoutStep::Payment.number() {
            if !self.effective_shipping_address().is_some_and(Address::is_complete) {
                missing.push("shipping address");
            }
            if self.shipping_method.is_none() {
                missing.push("shipping method");
            }
        }
        if step.number() >= CheckoutStep::Review.number() && self.payment_intent_id.is_none() {
            missing.push("payment method");
        }
        missing
    }

    /// Set the billing details.
    pub fn set_billing(&mut self, address: Address) {
        self.billing = Some(address);
        self.touch();
    }

    /// Ship somewhere other than the billing address.
    pub fn set_shipping_address(&mut self, address: Address) {
        self.shipping = Some(address.as_shipping());
        self.ship_to_billing = false;
        self.touch();
    }

    /// Ship to the billing address.
    pub fn set_ship_to_billing(&mut self, same: bool) {
        self.ship_to_billing = same;
        if same {
            self.shipping = None;
        }
        self.touch();
    }

    /// Set the shipping method.
    pub fn set_shipping_method(&mut self, selection: ShippingSelection) {
        self.shipping_method = Some(selection);
        self.touch();
    }

    pub fn set_payment_intent(&mut self, id: impl Into<String>) {
        self.payment_intent_id = Some(id.into());
        self.touch();
    }

    pub fn set_customer_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.customer_note = (!note.trim().is_empty()).then_some(note);
        self.touch();
    }

    /// Get the effective shipping address.
    pub fn effective_shipping_address(&self) -> Option<&Address> {
        if self.ship_to_billing {
            self.billing.as_ref()
        } else {
            self.shipping.as_ref()
        }
    }

    /// Customer email from the billing details.
    pub fn email(&self) -> Option<&str> {
        self.billing.as_ref().and_then(|b| b.email.as_deref())
    }

    /// Record a placed order.
    pub fn mark_complete(&mut self) {
        let mut step = CheckoutStep::Cart;
        while let Some(next) = step.next() {
            if !self.completed_steps.contains(&step) {
                self.completed_steps.push(step);
            }
            step = next;
        }
        self.step = CheckoutStep::Complete;
        self.touch();
    }

    /// Check if checkout is complete.
    pub fn is_complete(&self) -> bool {
        self.step == CheckoutStep::Complete
    }

    /// Check if checkout has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Get progress percentage.
    pub fn progress_percent(&self) -> u8 {
        let percent = u16::from(self.step.number()) * 100 / u16::from(CheckoutStep::Complete.number());
        u8::try_from(percent).unwrap_or(100)
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

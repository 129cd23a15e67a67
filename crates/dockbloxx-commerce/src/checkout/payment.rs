//! Payment intent types.

use crate::cart::CartTotals;
use crate::checkout::CheckoutFlow;
use crate::error::CommerceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to create a Stripe payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    pub receipt_email: Option<String>,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntentRequest {
    /// Charge for the cart totals plus the selected shipping rate, priced
    /// against those totals.
    pub fn for_order(totals: &CartTotals, flow: &CheckoutFlow) -> Result<Self, CommerceError> {
        let shipping = flow
            .shipping_method
            .as_ref()
            .ok_or_else(|| CommerceError::CheckoutIncomplete("shipping method".to_string()))?
            .repriced(totals)?;
        let amount = totals
            .grand_total
            .try_add(&shipping.rate)
            .ok_or_else(|| CommerceError::CurrencyMismatch {
                expected: totals.grand_total.currency.code().to_string(),
                got: shipping.rate.currency.code().to_string(),
            })?;
        if !amount.is_positive() {
            return Err(CommerceError::InvalidAmount(amount.display_amount()));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("item_count".to_string(), totals.item_count.to_string());
        if let Some(code) = &totals.coupon_code {
            metadata.insert("coupon".to_string(), code.clone());
        }

        Ok(Self {
            amount: amount.amount_cents,
            currency: amount.currency.stripe_code(),
            receipt_email: flow.email().map(str::to_string),
            description: None,
            metadata,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Form fields for the Stripe API.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        if let Some(email) = &self.receipt_email {
            pairs.push(("receipt_email".to_string(), email.clone()));
        }
        if let Some(description) = &self.description {
            pairs.push(("description".to_string(), description.clone()));
        }
        for (key, value) in &self.metadata {
            pairs.push((format!("metadata[{}]", key), value.clone()));
        }
        pairs
    }
}

/// Stripe payment intent status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl PaymentIntentStatus {
    /// Check if the payment has gone through.
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::Succeeded | PaymentIntentStatus::RequiresCapture
        )
    }
}

/// A created payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the browser to confirm the payment.
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
}

//! Address types.

use serde::{Deserialize, Serialize};

/// A billing or shipping address, using WooCommerce field names on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    /// Address line 1.
    #[serde(rename = "address_1")]
    pub address1: String,
    /// Address line 2 (apt, suite, etc.).
    #[serde(rename = "address_2", default)]
    pub address2: String,
    pub city: String,
    /// State/province code (e.g., "FL").
    #[serde(default)]
    pub state: String,
    /// Postal/ZIP code.
    pub postcode: String,
    /// Country code (e.g., "US").
    pub country: String,
    /// Only sent with billing addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Create a new address.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postcode: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            address1: address1.into(),
            city: city.into(),
            state: state.into(),
            postcode: postcode.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Get full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        [
            self.address1.as_str(),
            self.address2.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postcode.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .filter(|p| !p.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Check if address has everything needed to ship.
    pub fn is_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.address1,
            &self.city,
            &self.postcode,
            &self.country,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }

    /// Billing addresses also need a plausible email.
    pub fn is_complete_billing(&self) -> bool {
        self.is_complete()
            && self
                .email
                .as_deref()
                .is_some_and(|e| e.contains('@') && !e.starts_with('@') && !e.ends_with('@'))
    }

    /// Copy for use as the shipping address (no email).
    pub fn as_shipping(&self) -> Address {
        Address {
            email: None,
            ..self.clone()
        }
    }
}

//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in cart and checkout operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(u32, u32),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// A price or amount string could not be parsed.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Checkout incomplete.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),
}

/// Failures reported by the external commerce and payment APIs.
///
/// Clonable so a single failed fetch can be handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request exceeded its deadline.
    #[error("Request timed out")]
    Timeout,

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Whether this failure is worth retrying on a later navigation.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode(_) | ApiError::NotFound(_) => false,
        }
    }
}

/// Errors from the paginated product cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// Pages are 1-indexed.
    #[error("Invalid page number: {0}")]
    InvalidPage(u32),

    /// The page lies past the last known page of the namespace.
    #[error("Page {page} is out of range (namespace has {total_pages} pages)")]
    OutOfRange { page: u32, total_pages: u32 },

    #[error("Invalid listing namespace: {0:?}")]
    InvalidNamespace(String),

    /// The namespace changed while the page was loading.
    #[error("Listing changed while page {0} was loading")]
    Superseded(u32),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Http {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::Http {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::NotFound("coupon".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = CommerceError::QuantityExceedsLimit(10000, 9999);
        assert_eq!(err.to_string(), "Quantity 10000 exceeds maximum allowed (9999)");
    }
}

//! Stripe payment intents.

use crate::client::FetchClient;
use crate::config::StripeConfig;
use crate::endpoint::Endpoint;
use crate::FetchError;
use async_trait::async_trait;
use dockbloxx_commerce::checkout::{PaymentApi, PaymentIntent, PaymentIntentRequest};
use dockbloxx_commerce::ApiError;
use tracing::info;

/// Client for the Stripe REST API.
pub struct StripeClient {
    fetch: FetchClient,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self, FetchError> {
        config.validate()?;
        Ok(Self {
            fetch: FetchClient::new(format!("{}/v1", config.api_base.trim_end_matches('/')))?,
            secret_key: config.secret_key.clone(),
        })
    }

    /// Create a payment intent. Never retried.
    pub async fn post_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, FetchError> {
        let intent = self
            .fetch
            .request(Endpoint::PaymentIntents, "payment_intents")
            .bearer_auth(&self.secret_key)
            .form(request.to_form_pairs())
            .send()
            .await?
            .json::<PaymentIntent>()?;
        info!(intent = %intent.id, amount = intent.amount, "Payment intent created");
        Ok(intent)
    }

    #[cfg(test)]
    fn without_proxy(mut self) -> Self {
        self.fetch = self.fetch.without_proxy();
        self
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.fetch.base_url())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentApi for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        Ok(self.post_payment_intent(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{error_response, json_response, serve};
    use dockbloxx_commerce::checkout::PaymentIntentStatus;
    use std::collections::BTreeMap;

    fn request() -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount: 2599,
            currency: "usd".into(),
            receipt_email: Some("jane@example.com".into()),
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    fn client(api_base: &str) -> StripeClient {
        StripeClient::new(&StripeConfig {
            secret_key: "sk_test_123".into(),
            api_base: api_base.to_string(),
        })
        .unwrap()
        .without_proxy()
    }

    #[test]
    fn test_requires_secret_key() {
        assert!(matches!(
            StripeClient::new(&StripeConfig::default()),
            Err(FetchError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let server = serve(vec![json_response(
            &[],
            r#"{"id": "pi_1", "object": "payment_intent", "amount": 2599, "currency": "usd",
                "client_secret": "pi_1_secret_x", "status": "requires_payment_method"}"#,
        )])
        .await;

        let intent = client(&server.base_url)
            .create_payment_intent(&request())
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert!(server.request_lines()[0].starts_with("POST /v1/payment_intents"));
    }

    #[tokio::test]
    async fn test_card_error_is_not_retried() {
        let declined = error_response(
            402,
            r#"{"error": {"type": "card_error", "message": "Card declined"}}"#,
        );
        let server = serve(vec![declined.clone(), declined]).await;

        let err = client(&server.base_url)
            .create_payment_intent(&request())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Http {
                status: 402,
                message: "Card declined".into()
            }
        );
        assert_eq!(server.hits(), 1);
    }
}

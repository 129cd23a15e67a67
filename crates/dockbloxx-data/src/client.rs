//! Fetch client with endpoint tagging, timeouts and retries.

use crate::endpoint::Endpoint;
use crate::request::{Method, RequestBuilder};
use crate::response::Response;
use crate::retry::FetchPolicy;
use crate::FetchError;
use std::collections::HashMap;
use tracing::{debug, info_span, warn, Instrument};

/// HTTP client for outbound requests to one API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    default_headers: HashMap<String, String>,
    policies: HashMap<Endpoint, FetchPolicy>,
}

impl FetchClient {
    /// Create a client whose relative paths resolve against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dockbloxx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_headers: HashMap::new(),
            policies: HashMap::new(),
        })
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Override the policy for one endpoint.
    pub fn with_policy(mut self, endpoint: Endpoint, policy: FetchPolicy) -> Self {
        self.policies.insert(endpoint, policy);
        self
    }

    /// Bypass proxy settings so tests can reach a local server.
    #[cfg(test)]
    pub(crate) fn without_proxy(mut self) -> Self {
        self.http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("test client");
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The policy in force for `endpoint`.
    pub fn policy(&self, endpoint: Endpoint) -> FetchPolicy {
        self.policies
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| FetchPolicy::from_endpoint(endpoint))
    }

    /// Resolve a path against the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Start a request for `endpoint` at `path`.
    pub fn request(&self, endpoint: Endpoint, path: &str) -> ClientRequestBuilder<'_> {
        let mut builder = RequestBuilder::new(endpoint.method(), self.url(path));
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }
        ClientRequestBuilder {
            client: self,
            endpoint,
            builder,
        }
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> Result<Response, FetchError> {
        let policy = self.policy(endpoint);
        let timeout_ms = policy.timeout_ms();
        let method = builder.method();
        let mut attempt: u32 = 0;

        loop {
            let span = info_span!(
                "http",
                endpoint = %endpoint,
                method = method.as_str(),
                url = %builder.url(),
                attempt
            );
            let result = async {
                let response = builder
                    .to_reqwest(&self.http)
                    .timeout(policy.timeout)
                    .send()
                    .await
                    .map_err(|e| FetchError::from_reqwest(e, timeout_ms))?;
                let response = Response::read(response, timeout_ms).await?;
                debug!(status = response.status, bytes = response.body.len(), "Response received");
                response.error_for_status()
            }
            .instrument(span)
            .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if policy.retry.should_retry(method, &e, attempt) => {
                    let delay = policy.retry.backoff.delay_for_attempt(attempt);
                    warn!(
                        endpoint = %endpoint,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, attempt, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder<'a> {
    client: &'a FetchClient,
    endpoint: Endpoint,
    builder: RequestBuilder,
}

impl<'a> ClientRequestBuilder<'a> {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Append several query parameters.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.builder = self.builder.query_pairs(pairs);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Set the request body as form fields.
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.builder = self.builder.form(fields);
        self
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Add a basic authorization header.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.builder = self.builder.basic_auth(username, password);
        self
    }

    pub fn method(&self) -> Method {
        self.builder.method()
    }

    /// The request as it will be sent.
    pub fn build(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Send the request, retrying as the endpoint's policy allows.
    pub async fn send(self) -> Result<Response, FetchError> {
        self.client.execute(self.endpoint, self.builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{BackoffStrategy, RetryPolicy};
    use crate::test_support::{json_response, serve, status_response, Canned};
    use std::time::Duration;

    fn unavailable_then_ok() -> Vec<Canned> {
        vec![status_response(503), json_response(&[("X-WP-Total", "3")], "[]")]
    }

    fn local_client(base: String) -> FetchClient {
        FetchClient::new(base).unwrap().without_proxy()
    }

    fn fast_policy(retries: u32) -> FetchPolicy {
        FetchPolicy::new(
            Duration::from_secs(2),
            RetryPolicy::new(retries).with_backoff(BackoffStrategy::Fixed(Duration::from_millis(5))),
        )
    }

    #[test]
    fn test_url_resolution() {
        let client = FetchClient::new("https://dockbloxx.test/wp-json/wc/v3/").unwrap();
        assert_eq!(
            client.url("products"),
            "https://dockbloxx.test/wp-json/wc/v3/products"
        );
        assert_eq!(
            client.url("/products/categories"),
            "https://dockbloxx.test/wp-json/wc/v3/products/categories"
        );
        assert_eq!(client.url("https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_default_headers_and_policy() {
        let client = FetchClient::new("https://dockbloxx.test")
            .unwrap()
            .with_default_header("Accept", "application/json")
            .with_policy(Endpoint::Products, fast_policy(4));
        let request = client.request(Endpoint::Orders, "orders");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(
            request.build().headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(client.policy(Endpoint::Products).retry.max_retries, 4);
        assert_eq!(client.policy(Endpoint::Orders).retry.max_retries, 0);
    }

    #[tokio::test]
    async fn test_get_retries_server_errors() {
        let server = serve(unavailable_then_ok()).await;
        let client =
            local_client(server.base_url.clone()).with_policy(Endpoint::Products, fast_policy(2));

        let response = client.request(Endpoint::Products, "products").send().await.unwrap();

        assert_eq!(server.hits(), 2);
        assert_eq!(response.header_u64("X-WP-Total"), Some(3));
    }

    #[tokio::test]
    async fn test_post_is_sent_once() {
        let server = serve(unavailable_then_ok()).await;
        let client =
            local_client(server.base_url.clone()).with_policy(Endpoint::Orders, fast_policy(2));

        let result = client
            .request(Endpoint::Orders, "orders")
            .json(&serde_json::json!({"set_paid": false}))
            .unwrap()
            .send()
            .await;

        assert!(matches!(result, Err(FetchError::Http { status: 503, .. })));
        assert_eq!(server.hits(), 1);
    }
}

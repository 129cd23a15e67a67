//! HTTP request builder.

use crate::FetchError;
use serde::Serialize;
use std::collections::BTreeMap;

/// HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether repeating the request has no further effect.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Put | Method::Delete)
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Credentials attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP basic auth (WooCommerce consumer key and secret).
    Basic { username: String, password: String },
    /// Bearer token (Stripe secret key).
    Bearer(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => write!(f, "Basic({}:***)", username),
            Auth::Bearer(_) => write!(f, "Bearer(***)"),
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Serialized JSON.
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, String)>),
}

/// A builder for constructing HTTP requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) auth: Option<Auth>,
    pub(crate) body: Option<Body>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            auth: None,
            body: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append several query parameters.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        let json = serde_json::to_vec(value)?;
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Set the request body as form fields.
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(fields));
        self
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::Bearer(token.into()));
        self
    }

    /// Add a basic authorization header.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }

    /// Build a `reqwest` request on `client`.
    pub(crate) fn to_reqwest(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut request = client.request(self.method.to_reqwest(), &self.url);
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        request = match &self.auth {
            Some(Auth::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(Auth::Bearer(token)) => request.bearer_auth(token),
            None => request,
        };
        match &self.body {
            Some(Body::Json(bytes)) => request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            Some(Body::Form(fields)) => request.form(fields),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_query() {
        let builder = RequestBuilder::new(Method::Get, "https://dockbloxx.test/wp-json/wc/v3/products")
            .query("page", 2)
            .query("per_page", 12)
            .query_pairs(vec![("status".to_string(), "publish".to_string())]);
        assert_eq!(builder.query.len(), 3);
        assert_eq!(builder.query[0], ("page".to_string(), "2".to_string()));
    }

    #[test]
    fn test_reqwest_request_carries_auth_and_query() {
        let client = reqwest::Client::new();
        let request = RequestBuilder::new(Method::Get, "https://dockbloxx.test/wp-json/wc/v3/coupons")
            .query("code", "summer15")
            .basic_auth("ck_test", "cs_test")
            .to_reqwest(&client)
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().query(), Some("code=summer15"));
        let auth = request.headers().get(reqwest::header::AUTHORIZATION).unwrap();
        assert!(auth.to_str().unwrap().starts_with("Basic "));
    }

    #[test]
    fn test_form_body() {
        let client = reqwest::Client::new();
        let request = RequestBuilder::new(Method::Post, "https://api.stripe.test/v1/payment_intents")
            .form(vec![("amount".to_string(), "2599".to_string())])
            .bearer_auth("sk_test_123")
            .to_reqwest(&client)
            .build()
            .unwrap();

        let content_type = request.headers().get(reqwest::header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, "application/x-www-form-urlencoded");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"amount=2599");
    }

    #[test]
    fn test_auth_debug_hides_secrets() {
        let auth = Auth::Basic {
            username: "ck_test".into(),
            password: "cs_secret".into(),
        };
        assert!(!format!("{:?}", auth).contains("cs_secret"));
        assert!(!format!("{:?}", Auth::Bearer("sk_live".into())).contains("sk_live"));
    }

    #[test]
    fn test_method_idempotence() {
        assert!(Method::Get.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert_eq!(Method::Post.as_str(), "POST");
    }
}

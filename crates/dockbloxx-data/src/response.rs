//! HTTP response handling.

use crate::FetchError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The URL the response came from.
    pub url: String,
    /// The response headers, keyed by lower-case name.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

/// Error body shapes used by WooCommerce (`{"code","message"}`) and
/// Stripe (`{"error":{"message"}}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Woo { message: String },
    Stripe { error: StripeErrorBody },
}

#[derive(Deserialize)]
struct StripeErrorBody {
    message: String,
}

impl Response {
    /// Create a new response.
    pub fn new(
        status: u16,
        url: impl Into<String>,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            url: url.into(),
            headers,
            body,
        }
    }

    /// Read a `reqwest` response to the end.
    pub(crate) async fn read(response: reqwest::Response, timeout_ms: u64) -> Result<Self, FetchError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout_ms))?
            .to_vec();
        Ok(Self::new(status, url, headers, body))
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::Parse(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Get the raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parse a numeric header such as `X-WP-Total`.
    pub fn header_u64(&self, key: &str) -> Option<u64> {
        self.header(key).and_then(|v| v.trim().parse().ok())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// The API's error message, falling back to the raw body.
    pub fn error_message(&self) -> String {
        match serde_json::from_slice::<ErrorBody>(&self.body) {
            Ok(ErrorBody::Woo { message }) => message,
            Ok(ErrorBody::Stripe { error }) => error.message,
            Err(_) => {
                let text = String::from_utf8_lossy(&self.body);
                let text = text.trim();
                if text.is_empty() {
                    format!("status {}", self.status)
                } else {
                    text.chars().take(200).collect()
                }
            }
        }
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http {
                status: self.status,
                message: self.error_message(),
                url: self.url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> Response {
        Response::new(status, "https://dockbloxx.test/", HashMap::new(), body.to_vec())
    }

    fn make_response_with_headers(
        status: u16,
        headers: Vec<(&str, &str)>,
        body: &[u8],
    ) -> Response {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Response::new(status, "https://dockbloxx.test/", headers, body.to_vec())
    }

    #[test]
    fn test_response_status_classes() {
        assert!(make_response(200, b"").is_success());
        assert!(make_response(299, b"").is_success());
        assert!(!make_response(300, b"").is_success());
        assert!(make_response(404, b"").is_client_error());
        assert!(!make_response(500, b"").is_client_error());
        assert!(make_response(503, b"").is_server_error());
        assert!(!make_response(499, b"").is_server_error());
    }

    #[test]
    fn test_response_text_invalid_utf8() {
        let resp = make_response(200, &[0xff, 0xfe]);
        assert!(resp.text().is_err());
    }

    #[test]
    fn test_response_json() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Data {
            value: i32,
        }

        let resp = make_response(200, br#"{"value": 42}"#);
        let data: Data = resp.json().unwrap();
        assert_eq!(data, Data { value: 42 });

        let resp = make_response(200, b"not json");
        assert!(matches!(resp.json::<Data>(), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let resp = make_response_with_headers(200, vec![("Content-Type", "text/html")], b"");
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn test_wp_total_headers() {
        let resp = make_response_with_headers(
            200,
            vec![("X-WP-Total", "25"), ("X-WP-TotalPages", "3"), ("X-Bad", "many")],
            b"[]",
        );
        assert_eq!(resp.header_u64("x-wp-total"), Some(25));
        assert_eq!(resp.header_u64("X-WP-TotalPages"), Some(3));
        assert_eq!(resp.header_u64("X-Bad"), None);
    }

    #[test]
    fn test_error_for_status_woo_message() {
        let resp = make_response(
            400,
            br#"{"code":"woocommerce_rest_invalid_coupon","message":"Coupon \"x\" does not exist!","data":{"status":400}}"#,
        );
        match resp.error_for_status() {
            Err(FetchError::Http { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Coupon \"x\" does not exist!");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_stripe_message() {
        let resp = make_response(
            402,
            br#"{"error":{"type":"card_error","message":"Your card was declined."}}"#,
        );
        assert_eq!(resp.error_message(), "Your card was declined.");
    }

    #[test]
    fn test_error_for_status_plain_body() {
        assert_eq!(make_response(502, b"Bad Gateway").error_message(), "Bad Gateway");
        assert_eq!(make_response(500, b"").error_message(), "status 500");
        assert!(make_response(200, b"OK").error_for_status().is_ok());
    }
}

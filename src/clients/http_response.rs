//! HTTP response types shared by both API clients.
//!
//! This module provides the [`HttpResponse`] type and the parsed
//! rate-limit header it carries. The body is kept as raw text because the
//! distributor client re-parses it as XML while the Shopify client parses
//! it as JSON.

use std::collections::HashMap;

/// Rate limit information parsed from the `X-Shopify-Shop-Api-Call-Limit` header.
///
/// The header format is "X/Y" where X is the current request count and Y is
/// the bucket size.
///
/// # Example
///
/// ```rust
/// use stock_sync::clients::ApiCallLimit;
///
/// let limit = ApiCallLimit::parse("40/80").unwrap();
/// assert_eq!(limit.request_count, 40);
/// assert_eq!(limit.bucket_size, 80);
/// assert!((limit.usage_ratio() - 0.5).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiCallLimit {
    /// The current number of requests made in this bucket.
    pub request_count: u32,
    /// The maximum number of requests allowed in this bucket.
    pub bucket_size: u32,
}

impl ApiCallLimit {
    /// Parses the rate limit header value.
    ///
    /// # Arguments
    ///
    /// * `header_value` - The header value in "X/Y" format
    ///
    /// # Returns
    ///
    /// `Some(ApiCallLimit)` if parsing succeeds, `None` otherwise.
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let parts: Vec<&str> = header_value.split('/').collect();
        if parts.len() != 2 {
            return None;
        }

        let request_count = parts[0].parse().ok()?;
        let bucket_size = parts[1].parse().ok()?;

        Some(Self {
            request_count,
            bucket_size,
        })
    }

    /// Returns how much of the bucket is currently used, in `[0.0, 1.0+]`.
    ///
    /// An empty bucket size yields `1.0` so the caller backs off rather
    /// than dividing by zero.
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        if self.bucket_size == 0 {
            return 1.0;
        }
        f64::from(self.request_count) / f64::from(self.bucket_size)
    }

    /// Returns `true` if the bucket is exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.request_count >= self.bucket_size
    }
}

/// An HTTP response from either remote service.
///
/// Contains the status code, headers, raw body text, and the parsed
/// Shopify-specific header values the rate governor consumes.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: String,
    /// Rate limit information (from `X-Shopify-Shop-Api-Call-Limit` header).
    pub api_call_limit: Option<ApiCallLimit>,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with automatic header parsing.
    ///
    /// This constructor parses the headers the retry layers need:
    /// - `X-Shopify-Shop-Api-Call-Limit` -> `api_call_limit`
    /// - `Retry-After` -> `retry_request_after`
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: String) -> Self {
        let api_call_limit = headers
            .get("x-shopify-shop-api-call-limit")
            .and_then(|values| values.first())
            .and_then(|value| ApiCallLimit::parse(value));

        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.parse::<f64>().ok());

        Self {
            code,
            headers,
            body,
            api_call_limit,
            retry_request_after,
        }
    }

    /// Reads a [`reqwest::Response`] into an owned `HttpResponse`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the body cannot be read.
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let code = response.status().as_u16();
        let headers = Self::parse_headers(response.headers());
        let body = response.text().await?;
        Ok(Self::new(code, headers, body))
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    ///
    /// This ID is useful for debugging and is included in error logs.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Parses response headers into a `HashMap` with lowercase keys.
    fn parse_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

//! Transport retry wrapper shared by both API clients.
//!
//! [`Transport`] issues one outbound HTTP call at a time, applying the
//! per-call timeout and the bounded retry policy for timeout-class
//! failures. It deliberately does not interpret HTTP status codes; that is
//! the calling client's responsibility.
//!
//! # Retry Behavior
//!
//! - A timeout (the server is slow to accept the connection or to answer)
//!   is retried up to the attempt ceiling with a fixed inter-attempt delay.
//! - Any other transport failure (DNS, connection reset, TLS) propagates
//!   immediately without retry - the network path is broken and waiting
//!   will not fix it.
//! - Exhausting the attempts propagates [`TransportError::Timeout`] to the
//!   caller; the failure is never swallowed.

use std::time::Duration;

use crate::clients::errors::TransportError;
use crate::clients::http_response::HttpResponse;

/// Retry policy for one outbound call.
///
/// The defaults implement the production policy; tests construct compressed
/// policies so retries complete in milliseconds.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use stock_sync::clients::TransportPolicy;
///
/// let policy = TransportPolicy::default();
/// assert_eq!(policy.request_timeout, Duration::from_secs(30));
/// assert_eq!(policy.attempts, 3);
/// assert_eq!(policy.retry_delay, Duration::from_secs(5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Per-call timeout applied to every request.
    pub request_timeout: Duration,
    /// Total attempts allowed for timeout-class failures.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// HTTP transport with timeout and bounded retry.
///
/// Owns the underlying [`reqwest::Client`]; both API clients hold their own
/// `Transport` so their policies stay independent.
///
/// # Example
///
/// ```rust,ignore
/// let transport = Transport::new(TransportPolicy::default());
/// let response = transport
///     .send("GetProductStock", |http| {
///         http.post(url).header("content-type", "text/xml").body(envelope.clone())
///     })
///     .await?;
/// ```
#[derive(Debug)]
pub struct Transport {
    client: reqwest::Client,
    policy: TransportPolicy,
}

impl Transport {
    /// Creates a transport with the given retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(policy: TransportPolicy) -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(policy.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, policy }
    }

    /// Returns the policy this transport applies.
    #[must_use]
    pub const fn policy(&self) -> &TransportPolicy {
        &self.policy
    }

    /// Sends one request, retrying timeout-class failures.
    ///
    /// The `build` closure receives the shared [`reqwest::Client`] and
    /// produces a fresh request for each attempt.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] after the attempt ceiling is
    /// exhausted, or [`TransportError::Network`] immediately for any other
    /// transport failure.
    pub async fn send<F>(
        &self,
        operation: &'static str,
        build: F,
    ) -> Result<HttpResponse, TransportError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            match build(&self.client).send().await {
                Ok(response) => return Ok(HttpResponse::read(response).await?),
                Err(err) if err.is_timeout() => {
                    if attempt >= self.policy.attempts {
                        tracing::error!(
                            operation,
                            attempts = attempt,
                            "request timed out on final attempt"
                        );
                        return Err(TransportError::Timeout { attempts: attempt });
                    }
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.policy.attempts,
                        delay_secs = self.policy.retry_delay.as_secs_f64(),
                        "request timed out, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(err) => {
                    tracing::error!(operation, error = %err, "network error");
                    return Err(TransportError::Network(err));
                }
            }
        }
    }
}

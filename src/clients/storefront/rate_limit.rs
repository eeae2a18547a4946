//! Adaptive rate throttling for the Shopify Admin API.
//!
//! Shopify reports bucket usage on every response via the
//! `X-Shopify-Shop-Api-Call-Limit` header. The [`RateGovernor`] turns that
//! feedback into an inter-call delay: it grows the delay multiplicatively
//! as the bucket fills and decays it as the bucket drains, clamped to a
//! fixed range. Usage counters reset on a rolling window, modeling the
//! bucket's leak rate, and an exhausted bucket forces a cool-down sleep
//! before the next call.

use std::time::Duration;

use tokio::time::Instant;

use crate::clients::http_response::ApiCallLimit;

/// Throttling policy for the Shopify client.
///
/// The defaults implement the production policy; tests construct
/// compressed policies so throttling completes in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatePolicy {
    /// Initial inter-call delay, also the floor the delay decays toward.
    pub base_delay: Duration,
    /// Hard cap on the inter-call delay.
    pub max_delay: Duration,
    /// Cap applied while usage is only moderately high.
    pub moderate_cap: Duration,
    /// Usage ratio above which the delay grows aggressively.
    pub high_water: f64,
    /// Usage ratio above which the delay grows gently.
    pub moderate_water: f64,
    /// Rolling window after which usage counters reset.
    pub window: Duration,
    /// Sleep inserted when the bucket is reported exhausted.
    pub cooldown: Duration,
    /// Total attempts allowed for a 429 response.
    pub rate_limit_attempts: u32,
    /// Initial backoff for a 429 without a `Retry-After` hint.
    pub backoff_start: Duration,
    /// Ceiling for the doubling 429 backoff.
    pub backoff_cap: Duration,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
            moderate_cap: Duration::from_secs(1),
            high_water: 0.8,
            moderate_water: 0.5,
            window: Duration::from_secs(1),
            cooldown: Duration::from_secs(1),
            rate_limit_attempts: 5,
            backoff_start: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(16),
        }
    }
}

/// Adaptive delay controller, owned by one Shopify client instance.
///
/// State is `{calls_used, calls_allowed, window_start, current_delay}` and
/// is mutated after every response; it is never shared across client
/// instances.
#[derive(Debug)]
pub struct RateGovernor {
    policy: RatePolicy,
    delay: Duration,
    calls_used: u32,
    calls_allowed: u32,
    window_start: Instant,
}

impl RateGovernor {
    /// Creates a governor starting at the policy's base delay.
    #[must_use]
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            delay: policy.base_delay,
            calls_used: 0,
            calls_allowed: 0,
            window_start: Instant::now(),
        }
    }

    /// Returns the policy this governor applies.
    #[must_use]
    pub const fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Returns the current inter-call delay.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.delay
    }

    /// Returns the usage pair last observed inside the current window.
    #[must_use]
    pub const fn usage(&self) -> (u32, u32) {
        (self.calls_used, self.calls_allowed)
    }

    /// Sleeps the current inter-call delay before the next request.
    pub async fn pace(&mut self) {
        self.roll_window();
        tokio::time::sleep(self.delay).await;
    }

    /// Feeds one response's rate-limit header back into the governor.
    ///
    /// Adapts the inter-call delay to the reported usage ratio, and sleeps
    /// the cool-down when the bucket is exhausted. Responses without the
    /// header leave the delay unchanged.
    pub async fn observe(&mut self, limit: Option<ApiCallLimit>) {
        self.roll_window();

        let Some(limit) = limit else {
            return;
        };
        self.calls_used = limit.request_count;
        self.calls_allowed = limit.bucket_size;

        if limit.is_exhausted() {
            tracing::warn!(
                used = limit.request_count,
                allowed = limit.bucket_size,
                cooldown_secs = self.policy.cooldown.as_secs_f64(),
                "call quota exhausted, cooling down"
            );
            self.reset_window();
            tokio::time::sleep(self.policy.cooldown).await;
            return;
        }

        let ratio = limit.usage_ratio();
        self.delay = if ratio > self.policy.high_water {
            (self.delay.mul_f64(1.5)).min(self.policy.max_delay)
        } else if ratio >= self.policy.moderate_water {
            (self.delay.mul_f64(1.2)).min(self.policy.moderate_cap)
        } else {
            (self.delay.mul_f64(0.8)).max(self.policy.base_delay)
        };

        tracing::debug!(
            ratio,
            delay_secs = self.delay.as_secs_f64(),
            "adjusted inter-call delay"
        );
    }

    /// Resets usage counters when the rolling window has elapsed.
    fn roll_window(&mut self) {
        if self.window_start.elapsed() > self.policy.window {
            self.reset_window();
        }
    }

    fn reset_window(&mut self) {
        self.calls_used = 0;
        self.calls_allowed = 0;
        self.window_start = Instant::now();
    }
}

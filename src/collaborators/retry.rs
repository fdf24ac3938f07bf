//! Bounded timeout and exponential backoff for collaborator calls.
//!
//! Transient provider failures (timeouts, rate limits) are retried here,
//! inside the collaborator boundary, so that any error a node sees is
//! final. Permanent failures pass through on the first attempt.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::chat::{ChatError, ChatModel};
use async_trait::async_trait;

/// Retry and timeout budget for one logical collaborator call.
///
/// Delays grow as `base_delay * 2^(attempt - 1)`, capped at `max_delay`,
/// with up to 25% random jitter added to spread synchronized retries.
///
/// # Examples
///
/// ```rust
/// use supportflow::collaborators::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default().with_max_attempts(5);
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.call_timeout, Duration::from_secs(30));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
    /// Bounded timeout applied to each individual attempt.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Overrides the total attempt count.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Overrides the backoff range.
    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Backoff delay before retry number `attempt` (1-based), with jitter.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let capped = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay);
        let jitter_budget = (capped.as_millis() as u64) / 4;
        let jitter = if jitter_budget == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_budget)
        };
        capped + Duration::from_millis(jitter)
    }
}

/// Runs `operation` under the policy's timeout, retrying transient errors.
///
/// `is_transient` decides whether a failed attempt is worth repeating and
/// `on_timeout` builds the error representing an elapsed attempt timeout.
/// The final attempt's error is returned unchanged.
pub async fn call_with_retry<T, E, Fut>(
    policy: &RetryPolicy,
    mut operation: impl FnMut() -> Fut,
    is_transient: impl Fn(&E) -> bool,
    on_timeout: impl Fn(Duration) -> E,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(policy.call_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(policy.call_timeout)),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && is_transient(&error) => {
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "transient collaborator failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// [`ChatModel`] adapter that adds the retry policy to an inner model.
///
/// Wrap the provider client once at wiring time; nodes keep talking to a
/// plain `Arc<dyn ChatModel>` and stay unaware of retry mechanics.
pub struct RetryingChatModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M> RetryingChatModel<M> {
    /// Wraps `inner` with the given policy.
    #[must_use]
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for RetryingChatModel<M> {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        call_with_retry(
            &self.policy,
            || self.inner.generate(prompt),
            ChatError::is_transient,
            |waited| ChatError::Timeout {
                waited_ms: waited.as_millis() as u64,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Fails with the scripted errors, then answers.
    struct FlakyChat {
        failures: Mutex<Vec<ChatError>>,
        calls: Mutex<u32>,
    }

    impl FlakyChat {
        fn new(failures: Vec<ChatError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl ChatModel for FlakyChat {
        async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
            *self.calls.lock() += 1;
            let mut failures = self.failures.lock();
            if failures.is_empty() {
                Ok("answer".into())
            } else {
                Err(failures.remove(0))
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_backoff(Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let chat = RetryingChatModel::new(
            FlakyChat::new(vec![ChatError::RateLimited, ChatError::RateLimited]),
            fast_policy(),
        );
        let reply = chat.generate("hi").await.unwrap();
        assert_eq!(reply, "answer");
        assert_eq!(chat.inner.calls(), 3);
    }

    #[tokio::test]
    async fn retries_stop_at_the_attempt_cap() {
        let chat = RetryingChatModel::new(
            FlakyChat::new(vec![
                ChatError::RateLimited,
                ChatError::RateLimited,
                ChatError::RateLimited,
            ]),
            fast_policy(),
        );
        let err = chat.generate("hi").await.unwrap_err();
        assert_eq!(err, ChatError::RateLimited);
        assert_eq!(chat.inner.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let chat = RetryingChatModel::new(
            FlakyChat::new(vec![ChatError::Provider {
                message: "bad request".into(),
            }]),
            fast_policy(),
        );
        let err = chat.generate("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Provider { .. }));
        assert_eq!(chat.inner.calls(), 1);
    }

    #[tokio::test]
    async fn slow_attempts_are_cut_off_by_the_call_timeout() {
        struct NeverChat;

        #[async_trait]
        impl ChatModel for NeverChat {
            async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
                std::future::pending().await
            }
        }

        let policy = fast_policy()
            .with_max_attempts(2)
            .with_call_timeout(Duration::from_millis(5));
        let chat = RetryingChatModel::new(NeverChat, policy);
        let err = chat.generate("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout { .. }));
    }

    #[test]
    fn backoff_grows_and_stays_capped() {
        let policy = RetryPolicy::default();
        let first = policy.backoff_delay(1);
        let third = policy.backoff_delay(3);
        assert!(first >= policy.base_delay);
        assert!(third <= policy.max_delay + policy.max_delay / 4);
        assert!(policy.backoff_delay(40) <= policy.max_delay + policy.max_delay / 4);
    }
}

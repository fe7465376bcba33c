//! Timeout and retry decorator for any content generator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};

use crate::domain::session::{Category, Report, FINALIST_COUNT};
use crate::ports::{ContentGenerator, GenerationContext, GeneratorError, RevealedPair};

/// Bounds applied to every generator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub call_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(8),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(1u32 << retry.min(16))
    }
}

/// Wraps a generator so each call is time-boxed and transient failures
/// are retried with exponential backoff.
pub struct ResilientGenerator {
    inner: Arc<dyn ContentGenerator>,
    policy: RetryPolicy,
}

impl ResilientGenerator {
    pub fn new(inner: Arc<dyn ContentGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn with_retries<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<T, GeneratorError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, GeneratorError>> + Send,
        T: Send,
    {
        let mut retry_count = 0;

        loop {
            let err = match timeout(self.policy.call_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => GeneratorError::timeout(self.policy.call_timeout.as_millis() as u64),
            };

            if !err.is_retryable() || retry_count >= self.policy.max_retries {
                tracing::warn!(
                    operation,
                    attempts = retry_count + 1,
                    error = %err,
                    "Content generation failed"
                );
                return Err(err);
            }

            let delay = self.policy.backoff(retry_count);
            tracing::warn!(
                operation,
                retry = retry_count + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying content generation"
            );
            sleep(delay).await;
            retry_count += 1;
        }
    }
}

#[async_trait]
impl ContentGenerator for ResilientGenerator {
    async fn reveal(
        &self,
        context: &GenerationContext,
        first: &Category,
        second: &Category,
    ) -> Result<RevealedPair, GeneratorError> {
        self.with_retries("reveal", || self.inner.reveal(context, first, second))
            .await
    }

    async fn summarize(
        &self,
        context: &GenerationContext,
        finalists: &[Category; FINALIST_COUNT],
    ) -> Result<Report, GeneratorError> {
        self.with_retries("summarize", || self.inner.summarize(context, finalists))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use std::sync::Mutex;

    /// Fails with the queued errors first, then succeeds.
    struct FlakyGenerator {
        failures: Mutex<Vec<GeneratorError>>,
        delay: Duration,
        calls: Mutex<u32>,
    }

    impl FlakyGenerator {
        fn new(failures: Vec<GeneratorError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                delay: Duration::ZERO,
                calls: Mutex::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(vec![])
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContentGenerator for FlakyGenerator {
        async fn reveal(
            &self,
            _context: &GenerationContext,
            first: &Category,
            second: &Category,
        ) -> Result<RevealedPair, GeneratorError> {
            *self.calls.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            let next_failure = {
                let mut failures = self.failures.lock().unwrap();
                if failures.is_empty() {
                    None
                } else {
                    Some(failures.remove(0))
                }
            };
            match next_failure {
                Some(err) => Err(err),
                None => Ok(RevealedPair {
                    first: format!("about {}", first),
                    second: format!("about {}", second),
                }),
            }
        }

        async fn summarize(
            &self,
            _context: &GenerationContext,
            _finalists: &[Category; FINALIST_COUNT],
        ) -> Result<Report, GeneratorError> {
            Err(GeneratorError::AuthenticationFailed)
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            call_timeout: Duration::from_millis(200),
            max_retries,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn context() -> GenerationContext {
        GenerationContext::new(SessionId::new(), Default::default())
    }

    fn pair() -> (Category, Category) {
        (Category::new("医学").unwrap(), Category::new("文学").unwrap())
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let inner = Arc::new(FlakyGenerator::new(vec![
            GeneratorError::network("reset"),
            GeneratorError::malformed("no json"),
        ]));
        let generator = ResilientGenerator::new(inner.clone(), fast_policy(3));
        let (a, b) = pair();

        let revealed = generator.reveal(&context(), &a, &b).await.unwrap();

        assert_eq!(revealed.first, "about 医学");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let inner = Arc::new(FlakyGenerator::new(vec![
            GeneratorError::RateLimited,
            GeneratorError::RateLimited,
            GeneratorError::RateLimited,
        ]));
        let generator = ResilientGenerator::new(inner.clone(), fast_policy(2));
        let (a, b) = pair();

        let err = generator.reveal(&context(), &a, &b).await.unwrap_err();

        assert_eq!(err, GeneratorError::RateLimited);
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let inner = Arc::new(FlakyGenerator::new(vec![]));
        let generator = ResilientGenerator::new(inner, fast_policy(3));
        let finalists = [
            Category::new("a").unwrap(),
            Category::new("b").unwrap(),
            Category::new("c").unwrap(),
        ];

        let err = generator.summarize(&context(), &finalists).await.unwrap_err();
        assert_eq!(err, GeneratorError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let inner = Arc::new(FlakyGenerator::slow(Duration::from_secs(5)));
        let generator = ResilientGenerator::new(
            inner.clone(),
            RetryPolicy {
                call_timeout: Duration::from_millis(20),
                max_retries: 1,
                initial_backoff: Duration::from_millis(1),
            },
        );
        let (a, b) = pair();

        let err = generator.reveal(&context(), &a, &b).await.unwrap_err();

        assert_eq!(err, GeneratorError::timeout(20));
        assert_eq!(inner.calls(), 2);
    }
}

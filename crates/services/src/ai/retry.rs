use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AiError;

/// How a single attempt talks to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Primary model with `response_format = json_object`.
    JsonFormat,
    /// Primary model, free-form response.
    Plain,
    /// Fallback model, free-form response.
    FallbackModel,
}

/// Ladder for operations that expect structured JSON.
pub const JSON_LADDER: [Strategy; 3] = [Strategy::JsonFormat, Strategy::Plain, Strategy::FallbackModel];
/// Ladder for free-text operations.
pub const TEXT_LADDER: [Strategy; 3] = [Strategy::Plain, Strategy::Plain, Strategy::FallbackModel];

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count without any backoff.
    #[must_use]
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after the failed attempt `attempt` (0-based): `base * 2^attempt`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1_u32 << attempt.min(16))
    }

    /// Runs `call` until it succeeds or the attempts are used up, stepping
    /// down `ladder` one rung per attempt (the last rung repeats).
    ///
    /// `AiError::Disabled` is returned at once.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Exhausted` carrying the last failure.
    pub async fn run<T, F, Fut>(
        &self,
        op: &'static str,
        ladder: &[Strategy],
        mut call: F,
    ) -> Result<T, AiError>
    where
        F: FnMut(Strategy) -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let idx = usize::try_from(attempt).unwrap_or(usize::MAX);
            let strategy = ladder
                .get(idx)
                .or(ladder.last())
                .copied()
                .unwrap_or(Strategy::Plain);

            match call(strategy).await {
                Ok(value) => return Ok(value),
                Err(AiError::Disabled) => return Err(AiError::Disabled),
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op,
                        attempt = attempt + 1,
                        ?strategy,
                        error = %e,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "AI call failed"
                    );
                    last_error = Some(e);
                    if attempt + 1 < attempts && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(AiError::Exhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(AiError::EmptyResponse)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn walks_the_ladder_until_success() {
        let seen = Mutex::new(Vec::new());
        let result = RetryPolicy::default()
            .run("test", &JSON_LADDER, |strategy| {
                seen.lock().unwrap().push(strategy);
                let done = strategy == Strategy::FallbackModel;
                async move {
                    if done {
                        Ok(7)
                    } else {
                        Err(AiError::EmptyResponse)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(*seen.lock().unwrap(), JSON_LADDER.to_vec());
    }

    #[tokio::test]
    async fn exhausted_keeps_last_error() {
        let result: Result<(), _> = RetryPolicy::immediate(2)
            .run("test", &TEXT_LADDER, |_| async {
                Err(AiError::Parse("bad".into()))
            })
            .await;

        match result {
            Err(AiError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, AiError::Parse(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_is_not_retried() {
        let calls = Mutex::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run("test", &TEXT_LADDER, |_| {
                *calls.lock().unwrap() += 1;
                async { Err(AiError::Disabled) }
            })
            .await;

        assert!(matches!(result, Err(AiError::Disabled)));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}

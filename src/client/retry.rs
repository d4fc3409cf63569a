use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::Error;

const MAX_FACTOR: f64 = 10.0;

/// Exponential backoff for reads: after the first attempt, up to
/// `max_retries` more, each waiting `factor` times longer than the last.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            factor: if config.factor.is_nan() {
                1.0
            } else {
                config.factor.clamp(1.0, MAX_FACTOR)
            },
        }
    }
}

impl RetryPolicy {
    /// Waits before each retry, in order.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delay = self.base_delay;
        (0..self.max_retries)
            .map(|_| {
                let current = delay;
                delay = Duration::try_from_secs_f64(delay.as_secs_f64() * self.factor)
                    .unwrap_or(Duration::MAX);
                current
            })
            .collect()
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// retries run out. The last error is returned as is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut delays = self.delays().into_iter();
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => match delays.next() {
                    Some(delay) => {
                        warn!(
                            "{} failed: {}; retrying in {:?} ({} retries left)",
                            label,
                            err,
                            delay,
                            delays.len() + 1
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tokio::time::Instant;

    #[test]
    fn delays_grow_by_factor() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_millis(1500),
                Duration::from_millis(2250),
                Duration::from_millis(3375),
            ]
        );
    }

    #[test]
    fn huge_factor_is_clamped() {
        let config = RetryConfig {
            factor: 1e300,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.factor, MAX_FACTOR);
        assert_eq!(policy.delays()[2], Duration::from_millis(150_000));

        let config = RetryConfig {
            factor: f64::INFINITY,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from(&config).factor, MAX_FACTOR);
    }

    #[test]
    fn oversized_delays_saturate() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(u64::MAX / 2),
            factor: 1e300,
        };
        assert_eq!(policy.delays()[1], Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_retried_three_times_with_growing_gaps() {
        let policy = RetryPolicy::default();
        let calls = RefCell::new(Vec::new());

        let result: Result<(), Error> = policy
            .run("list", || {
                calls.borrow_mut().push(Instant::now());
                async { Err(Error::Timeout("30s".into())) }
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout(_))));
        let calls = calls.into_inner();
        assert_eq!(calls.len(), 4, "one attempt plus three retries");
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(gaps[0], Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn semantic_failure_is_not_retried() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;
        let result: Result<(), Error> = policy
            .run("list", || {
                attempts += 1;
                async {
                    Err(Error::Api {
                        code: 1,
                        message: "denied".into(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;
        let result = policy
            .run("list", || {
                attempts += 1;
                let outcome = if attempts < 3 {
                    Err(Error::HttpStatus(502))
                } else {
                    Ok(attempts)
                };
                async move { outcome }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }
}

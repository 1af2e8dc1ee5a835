use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{ClientError, ClientResult};

pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry policy for upstream calls: `max_attempts` tries, delay doubling after each failure
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: RETRY_BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let wait = match &e {
                        ClientError::RateLimited { wait_secs, .. } => {
                            delay.max(Duration::from_secs(*wait_secs))
                        }
                        _ => delay,
                    };
                    warn!(
                        "{} attempt {} failed: {}. Retrying in {:?}",
                        label, attempt, e, wait
                    );
                    tokio::time::sleep(wait).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!("{} failed after {} attempts: {}", label, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Fails with [`ClientError::AnalysisTimeout`] if `fut` does not finish in time.
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> ClientResult<T>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut).await.map_err(|_| {
        error!("Timed out after {} seconds", deadline.as_secs());
        ClientError::AnalysisTimeout(deadline.as_secs())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = fast_policy(3)
            .run("serper", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClientError::Timeout("serper".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: ClientResult<()> = fast_policy(3)
            .run("semrush", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Timeout("semrush".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(ClientError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: ClientResult<()> = fast_policy(5)
            .run("semrush", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Api {
                        service: "semrush".into(),
                        message: "ERROR 132 :: API UNITS BALANCE IS ZERO".into(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_wait_overrides_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = std::time::Instant::now();
        let result = fast_policy(2)
            .run("semrush", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ClientError::RateLimited {
                            service: "semrush".into(),
                            wait_secs: 1,
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_deadline() {
        let ok = with_deadline(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(ok.unwrap(), 7);

        let late = with_deadline(
            Duration::from_millis(5),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await;
        assert!(matches!(late, Err(ClientError::AnalysisTimeout(0))));
    }
}

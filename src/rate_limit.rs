use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Service;

#[derive(Debug)]
struct Window {
    limit: u32,
    calls: u32,
    started: Instant,
}

impl Window {
    fn roll(&mut self, length: Duration) {
        if self.started.elapsed() >= length {
            self.calls = 0;
            self.started = Instant::now();
        }
    }

    fn remaining(&self, length: Duration) -> Duration {
        length.saturating_sub(self.started.elapsed())
    }
}

/// Fixed-window request budget per external service
pub struct RateLimiter {
    windows: Mutex<HashMap<Service, Window>>,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// One-minute windows with the per-service limits from [`Service::rate_limit_per_minute`]
    pub fn new() -> Self {
        let limits = Service::ALL.map(|s| (s, s.rate_limit_per_minute()));
        Self::with_limits(Duration::from_secs(60), &limits)
    }

    pub fn with_limits(window: Duration, limits: &[(Service, u32)]) -> Self {
        let now = Instant::now();
        let windows = limits
            .iter()
            .map(|(service, limit)| {
                (
                    *service,
                    Window {
                        limit: *limit,
                        calls: 0,
                        started: now,
                    },
                )
            })
            .collect();
        Self {
            windows: Mutex::new(windows),
            window,
        }
    }

    pub async fn can_make_call(&self, service: Service) -> bool {
        let mut windows = self.windows.lock().await;
        match windows.get_mut(&service) {
            Some(w) => {
                w.roll(self.window);
                w.calls < w.limit
            }
            None => true,
        }
    }

    pub async fn record_call(&self, service: Service) {
        if let Some(w) = self.windows.lock().await.get_mut(&service) {
            w.roll(self.window);
            w.calls += 1;
        }
    }

    /// How long until the next call to `service` is allowed
    pub async fn wait_time(&self, service: Service) -> Duration {
        let mut windows = self.windows.lock().await;
        match windows.get_mut(&service) {
            Some(w) => {
                w.roll(self.window);
                if w.calls < w.limit {
                    Duration::ZERO
                } else {
                    w.remaining(self.window)
                }
            }
            None => Duration::ZERO,
        }
    }

    /// Waits for a free slot and records the call.
    pub async fn acquire(&self, service: Service) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let Some(w) = windows.get_mut(&service) else {
                    return;
                };
                w.roll(self.window);
                if w.calls < w.limit {
                    w.calls += 1;
                    debug!("{} call {}/{} in current window", service, w.calls, w.limit);
                    return;
                }
                w.remaining(self.window)
            };

            warn!(
                "Rate limit reached for {}, waiting {:.1}s",
                service,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }
}

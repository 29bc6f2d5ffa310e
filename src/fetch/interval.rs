use std::cmp::min;
use std::time::Duration;

pub const RETRY_INTERVAL_MIN: Duration = Duration::from_secs(1);
pub const RETRY_INTERVAL_MAX: Duration = Duration::from_secs(32);

/// Sleep interval policy of the refresh loop.
///
/// Successful exchanges sleep the configured refresh interval. Failures back
/// off exponentially from [`RETRY_INTERVAL_MIN`] up to [`RETRY_INTERVAL_MAX`];
/// a single success resets the backoff.
pub struct RefreshInterval {
    refresh: Duration,
    retry: Duration,
}

impl RefreshInterval {
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            retry: RETRY_INTERVAL_MIN,
        }
    }

    /// Advances the interval state and returns how long to sleep before the
    /// next exchange.
    pub fn next(&mut self, success: bool) -> Duration {
        if success {
            self.retry = RETRY_INTERVAL_MIN;
            return self.refresh;
        }
        let current = self.retry;
        self.retry = min(self.retry * 2, RETRY_INTERVAL_MAX);
        current
    }
}

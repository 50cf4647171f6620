use std::time::Duration;
use tokio_retry::strategy::jitter;

/// Bounded exponential backoff for a single logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Sleep before the second attempt; doubles for each one after
    pub base_delay: Duration,
    pub max_delay: Option<Duration>,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: None,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Delays between consecutive attempts: `max_attempts - 1` of them
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let cap = self.max_delay;
        let randomize = self.jitter;
        let retries = usize::try_from(self.max_attempts.saturating_sub(1)).unwrap_or(usize::MAX);

        std::iter::successors(Some(self.base_delay), |delay| delay.checked_mul(2))
            .map(move |delay| cap.map_or(delay, |cap| delay.min(cap)))
            .map(move |delay| if randomize { jitter(delay) } else { delay })
            .take(retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_doubles() {
        let delays: Vec<_> = RetryPolicy::default().delays().collect();
        assert_eq!(
            delays,
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn test_cap_applies() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Some(Duration::from_millis(300)),
            jitter: false,
        };
        let delays: Vec<_> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 300, 300]);
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delays().count(), 0);
    }

    #[test]
    fn test_jitter_never_exceeds_delay() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for (delay, ceiling) in policy.delays().zip([1000, 2000]) {
            assert!(delay <= Duration::from_millis(ceiling));
        }
    }
}

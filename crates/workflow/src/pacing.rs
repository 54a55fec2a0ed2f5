//! Pacing between committed rows during a full-sheet scan.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on how quickly a scan commits rows.
///
/// After every committed row the processor waits
/// `interval / commits_per_interval`. The default (one commit per two
/// seconds) keeps a scan from flooding the inference endpoint. Skipped and
/// failed rows are not paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingPolicy {
    pub commits_per_interval: u32,
    pub interval: Duration,
}

impl PacingPolicy {
    pub fn new(commits_per_interval: u32, interval: Duration) -> Self {
        Self {
            commits_per_interval,
            interval,
        }
    }

    /// No pause between commits.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay inserted after each committed row.
    pub fn delay_after_commit(&self) -> Duration {
        if self.commits_per_interval == 0 {
            return self.interval;
        }
        self.interval / self.commits_per_interval
    }

    pub(crate) async fn pause(&self) {
        let delay = self.delay_after_commit();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pauses_two_seconds_per_commit() {
        assert_eq!(
            PacingPolicy::default().delay_after_commit(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn delay_is_spread_across_commits_per_interval() {
        let policy = PacingPolicy::new(4, Duration::from_secs(2));
        assert_eq!(policy.delay_after_commit(), Duration::from_millis(500));
    }

    #[test]
    fn disabled_policy_has_no_delay() {
        assert!(PacingPolicy::disabled().delay_after_commit().is_zero());
    }
}

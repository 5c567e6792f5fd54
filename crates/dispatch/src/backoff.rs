//! Pure backoff policy: given the current delay and a send outcome, compute
//! the next delay. The batch loop performs the actual sleep.

use {
    rand::Rng,
    serde::{Deserialize, Serialize},
    std::time::Duration,
};

/// Tunable pacing and quarantine policy for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Lower bound for the inter-send delay, in seconds.
    pub floor_secs: f64,
    /// Upper bound for the inter-send delay, in seconds.
    pub ceiling_secs: f64,
    /// Multiplier applied after a success while above the decay threshold.
    pub decay_factor: f64,
    /// Successes only decay the delay while it exceeds this many seconds.
    pub decay_threshold_secs: f64,
    /// Bounds of the randomized delay a fresh batch starts with.
    pub initial_min_secs: f64,
    pub initial_max_secs: f64,
    /// Consecutive failures before a recipient is disabled. The historical
    /// default is 1: any failed send quarantines the recipient until a later
    /// inbound interaction re-enables them.
    pub disable_after_failures: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            floor_secs: 0.25,
            ceiling_secs: 60.0,
            decay_factor: 0.7,
            decay_threshold_secs: 1.0,
            initial_min_secs: 0.5,
            initial_max_secs: 2.0,
            disable_after_failures: 1,
        }
    }
}

impl BackoffPolicy {
    /// Whether `consecutive_failures` has crossed the quarantine threshold.
    #[must_use]
    pub fn should_disable(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.disable_after_failures.max(1)
    }
}

/// Outcome of one send as the backoff sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Rejected,
}

/// Current inter-send delay, scoped to one batch. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffState {
    delay_secs: f64,
}

impl BackoffState {
    /// Randomized starting delay for a fresh batch.
    pub fn initial(policy: &BackoffPolicy) -> Self {
        let lo = policy.initial_min_secs.max(policy.floor_secs);
        let hi = policy.initial_max_secs.max(lo);
        let delay_secs = if hi > lo {
            rand::rng().random_range(lo..hi)
        } else {
            lo
        };
        Self { delay_secs }
    }

    /// Fixed starting delay, mainly for tests and replays.
    #[must_use]
    pub fn from_secs(delay_secs: f64) -> Self {
        Self {
            delay_secs: delay_secs.max(0.0),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs)
    }

    #[must_use]
    pub fn delay_secs(&self) -> f64 {
        self.delay_secs
    }

    /// Next state after `outcome`. Decays toward the floor on success while
    /// above the threshold, at least doubles on failure up to the ceiling.
    #[must_use]
    pub fn next(&self, policy: &BackoffPolicy, outcome: SendOutcome) -> Self {
        let delay_secs = match outcome {
            SendOutcome::Delivered => {
                if self.delay_secs > policy.decay_threshold_secs {
                    (self.delay_secs * policy.decay_factor).max(policy.floor_secs)
                } else {
                    self.delay_secs
                }
            },
            // Growth is monotone in the previous delay and at least doubles.
            SendOutcome::Rejected => (self.delay_secs * 2.0)
                .max(policy.floor_secs)
                .min(policy.ceiling_secs),
        };
        Self { delay_secs }
    }
}

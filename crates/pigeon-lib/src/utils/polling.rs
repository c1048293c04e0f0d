// Polling utility
// Fixed-interval polling with an attempt budget, shared by every long-running kind

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default polling interval (10 seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default attempt budget (10 minutes at the default interval)
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Interval and attempt budget for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPolicy {
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Total time the budget allows, used in timeout messages
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Result of a single status check
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep<T> {
    Ready(T),
    Pending,
}

/// How a polling loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T, E> {
    Ready(T),
    Failed(E),
    Exhausted { attempts: u32 },
}

/// Poll `check` every `policy.interval` until it reports ready, errors, or the
/// attempt budget runs out. The first check happens after one interval.
///
/// `check` receives the 1-based attempt number.
pub async fn poll_until<T, E, F, Fut>(policy: &PollPolicy, mut check: F) -> PollOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStep<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        match check(attempt).await {
            Ok(PollStep::Ready(value)) => return PollOutcome::Ready(value),
            Ok(PollStep::Pending) => {
                log::debug!("[poll] attempt {}/{} still pending", attempt, policy.max_attempts);
            }
            Err(err) => return PollOutcome::Failed(err),
        }
    }

    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

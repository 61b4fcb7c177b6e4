//! Readiness polling with bounded exponential backoff.

use localgate_core::ReadinessConfig;
use std::future::Future;
use std::time::Duration;

use crate::BackendError;

/// Result of a single readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The daemon answered with a success status
    Ready,
    /// The daemon answered, but not with success
    NotReady(String),
    /// No answer at all
    Unreachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReadinessPolicy {
    /// A policy that probes exactly once
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay slept after failed attempt number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl From<&ReadinessConfig> for ReadinessPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

/// Run `probe` until it reports ready or the policy's attempts run out.
///
/// When attempts are exhausted the error reflects the last outcome:
/// `Unreachable` if nothing answered, `NotReady` if something did.
pub async fn poll_until_ready<F, Fut>(
    url: &str,
    policy: &ReadinessPolicy,
    mut probe: F,
) -> Result<(), BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeOutcome>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        let error = match probe().await {
            ProbeOutcome::Ready => {
                tracing::info!("Model daemon at {} is ready (attempt {})", url, attempt + 1);
                return Ok(());
            }
            ProbeOutcome::NotReady(reason) => BackendError::NotReady {
                url: url.to_string(),
                reason,
            },
            ProbeOutcome::Unreachable(reason) => BackendError::Unreachable {
                url: url.to_string(),
                reason,
            },
        };
        tracing::debug!("Readiness probe {}/{} failed: {}", attempt + 1, attempts, error);
        last_error = Some(error);

        if attempt + 1 < attempts {
            tokio::time::sleep(policy.backoff(attempt)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| BackendError::Unreachable {
        url: url.to_string(),
        reason: "not probed".to_string(),
    }))
}

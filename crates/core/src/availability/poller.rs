//! Polls the storefront until a target becomes purchasable.

use std::time::Duration;

use tracing::info;

use crate::metrics::AVAILABILITY_POLLS;
use crate::orchestrator::{with_jitter, PursuitConfig};
use crate::storefront::{StorefrontApi, StorefrontError, Target};

/// Result of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Availability queries issued, including the positive one.
    pub queries: u32,
}

/// Gates entry into checkout on the item being purchasable.
#[derive(Clone)]
pub struct AvailabilityPoller {
    api: StorefrontApi,
    interval: Duration,
    jitter_ms: u64,
}

impl AvailabilityPoller {
    pub fn new(api: StorefrontApi, interval: Duration, jitter_ms: u64) -> Self {
        Self {
            api,
            interval,
            jitter_ms,
        }
    }

    pub fn from_config(api: StorefrontApi, config: &PursuitConfig) -> Self {
        Self::new(
            api,
            Duration::from_secs(config.poll_interval_secs),
            config.poll_jitter_ms,
        )
    }

    /// Single availability query.
    pub async fn is_purchasable(&self, target: &Target) -> Result<bool, StorefrontError> {
        let result = self.api.is_purchasable(target).await;
        let label = match &result {
            Ok(true) => "available",
            Ok(false) => "unavailable",
            Err(_) => "error",
        };
        AVAILABILITY_POLLS.with_label_values(&[label]).inc();
        result
    }

    /// Query until the target is purchasable, sleeping the poll interval
    /// between negative answers.
    ///
    /// Never gives up on its own; a failed query is returned to the caller.
    pub async fn wait_until_purchasable(
        &self,
        target: &Target,
    ) -> Result<PollOutcome, StorefrontError> {
        let mut queries = 0u32;
        loop {
            queries += 1;
            if self.is_purchasable(target).await? {
                info!("Item {} available!", target);
                return Ok(PollOutcome { queries });
            }

            let wait = with_jitter(self.interval, self.jitter_ms);
            info!(
                "Item {} not in stock, retrying in {:.1}s",
                target,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

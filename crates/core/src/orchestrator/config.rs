//! Pursuit configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::de;

/// Configuration for the pursuit orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitConfig {
    /// Item identifiers (SKUs) to pursue.
    /// Accepts a comma-separated string or a list.
    #[serde(deserialize_with = "de::comma_separated")]
    pub targets: Vec<String>,

    /// Seconds between availability queries while an item is out of stock.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound of the random delay added to each poll wait (milliseconds).
    #[serde(default)]
    pub poll_jitter_ms: u64,

    /// Pause between add-to-cart attempts while the cart stays empty
    /// (milliseconds, 0 = retry immediately).
    #[serde(default = "default_reserve_retry_delay")]
    pub reserve_retry_delay_ms: u64,

    /// What to do after a failed attempt.
    #[serde(default)]
    pub restart: RestartConfig,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_reserve_retry_delay() -> u64 {
    500
}

/// Restart policy applied after a failed poll or checkout attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Maximum restarts per pursuit. `None` restarts forever.
    pub max_restarts: Option<u32>,
    /// Delay before the first restart (milliseconds).
    pub backoff_initial_ms: u64,
    /// Cap on the exponential delay (milliseconds).
    pub backoff_max_ms: u64,
    pub backoff_multiplier: f64,
    /// Upper bound of the random delay added on top (milliseconds).
    pub jitter_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            max_restarts: None,
            backoff_initial_ms: 0,
            backoff_max_ms: 60_000,
            backoff_multiplier: 2.0,
            jitter_ms: 0,
        }
    }
}

impl RestartConfig {
    /// Whether restart number `restart` (1-based) is still allowed.
    pub fn allows(&self, restart: u32) -> bool {
        self.max_restarts.map_or(true, |max| restart <= max)
    }

    /// Exponential delay for restart number `restart` (1-based), without jitter.
    pub fn base_delay(&self, restart: u32) -> Duration {
        if self.backoff_initial_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = restart.saturating_sub(1).min(64) as i32;
        let delay =
            self.backoff_initial_ms as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        Duration::from_millis(delay.min(self.backoff_max_ms as f64) as u64)
    }

    /// Delay before restart number `restart`, jitter included.
    pub fn delay_for(&self, restart: u32) -> Duration {
        with_jitter(self.base_delay(restart), self.jitter_ms)
    }
}

/// `base` plus a uniformly random delay in `0..=jitter_ms` milliseconds.
pub fn with_jitter(base: Duration, jitter_ms: u64) -> Duration {
    if jitter_ms == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let config: PursuitConfig = toml::from_str(r#"targets = "6436919""#).unwrap();
        assert_eq!(config.targets, vec!["6436919"]);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.poll_jitter_ms, 0);
        assert_eq!(config.reserve_retry_delay_ms, 500);
        assert_eq!(config.restart, RestartConfig::default());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            targets = ["6436919", "6430161"]
            poll_interval_secs = 5
            poll_jitter_ms = 250
            reserve_retry_delay_ms = 0

            [restart]
            max_restarts = 3
            backoff_initial_ms = 1000
            backoff_max_ms = 8000
            backoff_multiplier = 3.0
            jitter_ms = 100
        "#;
        let config: PursuitConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.reserve_retry_delay_ms, 0);
        assert_eq!(config.restart.max_restarts, Some(3));
        assert_eq!(config.restart.backoff_multiplier, 3.0);
    }

    #[test]
    fn test_default_policy_restarts_immediately_forever() {
        let policy = RestartConfig::default();
        assert!(policy.allows(1));
        assert!(policy.allows(u32::MAX));
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(50), Duration::ZERO);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RestartConfig {
            backoff_initial_ms: 1000,
            backoff_max_ms: 5000,
            ..Default::default()
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.base_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.base_delay(4), Duration::from_millis(5000));
        assert_eq!(policy.base_delay(1000), Duration::from_millis(5000));
    }

    #[test]
    fn test_max_restarts() {
        let policy = RestartConfig {
            max_restarts: Some(2),
            ..Default::default()
        };
        assert!(policy.allows(2));
        assert!(!policy.allows(3));

        let never = RestartConfig {
            max_restarts: Some(0),
            ..Default::default()
        };
        assert!(!never.allows(1));
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(100);
        assert_eq!(with_jitter(base, 0), base);
        for _ in 0..50 {
            let delay = with_jitter(base, 20);
            assert!(delay >= base && delay <= Duration::from_millis(120));
        }
    }
}

//! Types for the pursuit orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::checkout::{CheckoutStep, StepFailure};
use crate::storefront::{StorefrontError, Target};

/// Errors that prevent the orchestrator from starting or collecting pursuits.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No targets to pursue.
    #[error("no targets to pursue")]
    NoTargets,

    /// A pursuit task panicked or was aborted.
    #[error("pursuit task failed: {0}")]
    TaskFailed(String),
}

/// Terminal outcome of one pursuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PursuitResult {
    /// The order was placed.
    Completed {
        order_id: String,
        /// Poll-to-pipeline cycles it took, the successful one included.
        attempts: u32,
    },
    /// The pursuit stopped without placing an order.
    Aborted { reason: AbortReason },
}

impl PursuitResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, PursuitResult::Completed { .. })
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            PursuitResult::Completed { order_id, .. } => Some(order_id),
            PursuitResult::Aborted { .. } => None,
        }
    }
}

impl fmt::Display for PursuitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PursuitResult::Completed { order_id, attempts } => {
                write!(f, "completed order {} after {} attempt(s)", order_id, attempts)
            }
            PursuitResult::Aborted { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Shutdown was requested.
    Interrupted,
    /// The restart ceiling was exceeded.
    RestartLimitReached { restarts: u32 },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Interrupted => f.write_str("interrupted"),
            AbortReason::RestartLimitReached { restarts } => {
                write!(f, "restart limit reached after {} restart(s)", restarts)
            }
        }
    }
}

/// One finished pursuit, as reported by [`super::PursuitOrchestrator::run`].
#[derive(Debug, Clone, Serialize)]
pub struct PursuitSummary {
    pub target: Target,
    pub result: PursuitResult,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Where in the lifecycle an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PursuitStage {
    Availability,
    Checkout(CheckoutStep),
}

impl fmt::Display for PursuitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PursuitStage::Availability => f.write_str("availability"),
            PursuitStage::Checkout(step) => write!(f, "checkout/{}", step),
        }
    }
}

/// A failed attempt.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct PursuitFault {
    pub stage: PursuitStage,
    #[source]
    pub error: StorefrontError,
}

impl PursuitFault {
    pub fn is_expected(&self) -> bool {
        self.error.is_expected()
    }
}

impl From<StepFailure> for PursuitFault {
    fn from(failure: StepFailure) -> Self {
        Self {
            stage: PursuitStage::Checkout(failure.step),
            error: failure.error,
        }
    }
}

//! Pursuit orchestrator.
//!
//! Runs one pursuit per target:
//! - **Availability**: concurrent polling, one loop per target
//! - **Checkout**: sequential, a single lock shared by all pursuits
//! - **Recovery**: any fault restarts the pursuit from polling

mod config;
mod runner;
mod types;

pub use config::{with_jitter, PursuitConfig, RestartConfig};
pub use runner::{PursuitOrchestrator, ShutdownHandle};
pub use types::{
    AbortReason, OrchestratorError, PursuitFault, PursuitResult, PursuitStage, PursuitSummary,
};

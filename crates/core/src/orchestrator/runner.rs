//! Pursuit orchestrator implementation.
//!
//! One task per target:
//! - Availability: concurrent polling, no coordination between targets
//! - Checkout: serialized by a single lock shared by every pursuit
//! - Faults: logged, lock released, then the pursuit restarts from polling

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::availability::AvailabilityPoller;
use crate::checkout::{CheckoutPipeline, CheckoutSettings};
use crate::metrics::{CHECKOUT_LOCK_WAIT, ORDERS_COMPLETED, PURSUIT_RESTARTS};
use crate::storefront::{Order, StorefrontApi, Target};
use crate::transport::Transport;

use super::config::PursuitConfig;
use super::types::{
    AbortReason, OrchestratorError, PursuitFault, PursuitResult, PursuitStage, PursuitSummary,
};

/// Requests shutdown of every pursuit of one orchestrator.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// The pursuit orchestrator - drives targets from polling to a placed order.
#[derive(Clone)]
pub struct PursuitOrchestrator {
    config: PursuitConfig,
    poller: AvailabilityPoller,
    pipeline: CheckoutPipeline,

    // Shared between every pursuit spawned from this orchestrator
    checkout_lock: Arc<Mutex<()>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl PursuitOrchestrator {
    /// Create a new orchestrator.
    ///
    /// `transport` must already carry the authenticated session.
    pub fn new(
        config: PursuitConfig,
        transport: Arc<dyn Transport>,
        settings: CheckoutSettings,
    ) -> Self {
        let api = StorefrontApi::new(transport);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            poller: AvailabilityPoller::from_config(api.clone(), &config),
            pipeline: CheckoutPipeline::new(api, settings),
            config,
            checkout_lock: Arc::new(Mutex::new(())),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Stop every pursuit at its next suspension point.
    ///
    /// Pursuits started after this call stop immediately.
    pub fn shutdown(&self) {
        info!("Shutdown requested, stopping pursuits");
        self.shutdown_tx.send_replace(true);
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Whether some pursuit currently holds the checkout lock.
    pub fn is_checkout_in_progress(&self) -> bool {
        self.checkout_lock.try_lock().is_err()
    }

    /// Pursue every target concurrently and wait for all of them to finish.
    ///
    /// Duplicate targets are pursued once.
    pub async fn run(&self, targets: Vec<Target>) -> Result<Vec<PursuitSummary>, OrchestratorError> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(targets.len());
        for target in targets {
            if seen.insert(target.clone()) {
                unique.push(target);
            } else {
                warn!("Ignoring duplicate target {}", target);
            }
        }

        if unique.is_empty() {
            return Err(OrchestratorError::NoTargets);
        }

        info!(
            "Pursuing {} item(s): {}",
            unique.len(),
            unique
                .iter()
                .map(Target::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let handles: Vec<_> = unique
            .into_iter()
            .map(|target| {
                let orchestrator = self.clone();
                tokio::spawn(async move {
                    let started_at = Utc::now();
                    let result = orchestrator.pursue(&target).await;
                    PursuitSummary {
                        target,
                        result,
                        started_at,
                        finished_at: Utc::now(),
                    }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.map_err(|e| OrchestratorError::TaskFailed(e.to_string())))
            .collect()
    }

    /// Run the full lifecycle for one target until an order is placed, the
    /// restart ceiling is hit, or shutdown is requested.
    pub async fn pursue(&self, target: &Target) -> PursuitResult {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut restarts = 0u32;

        loop {
            let attempt = attempt_number(restarts);
            debug!("Starting attempt {} for item {}", attempt, target);

            let outcome = tokio::select! {
                _ = shutdown_rx.wait_for(|stop| *stop) => None,
                outcome = self.attempt(target) => Some(outcome),
            };

            let fault = match outcome {
                None => return interrupted(target),
                Some(Ok(order)) => {
                    ORDERS_COMPLETED.inc();
                    info!(
                        "Order {} placed for item {} (attempt {})",
                        order.id, target, attempt
                    );
                    return PursuitResult::Completed {
                        order_id: order.id,
                        attempts: attempt,
                    };
                }
                Some(Err(fault)) => fault,
            };

            // The lock guard is gone by now: it lived inside `attempt`.
            if fault.is_expected() {
                warn!(
                    "Attempt {} for item {} failed at {}: {}",
                    attempt, target, fault.stage, fault.error
                );
            } else {
                error!(
                    "Unexpected error on attempt {} for item {} at {}: {}",
                    attempt, target, fault.stage, fault.error
                );
            }

            restarts = attempt;
            if !self.config.restart.allows(restarts) {
                let performed = restarts.saturating_sub(1);
                warn!(
                    "Giving up on item {} after {} restart(s)",
                    target, performed
                );
                return PursuitResult::Aborted {
                    reason: AbortReason::RestartLimitReached {
                        restarts: performed,
                    },
                };
            }

            let kind = if fault.is_expected() { "expected" } else { "unexpected" };
            PURSUIT_RESTARTS.with_label_values(&[kind]).inc();

            let delay = self.config.restart.delay_for(restarts);
            info!(
                "Restarting pursuit of item {} in {:.1}s (restart {})",
                target,
                delay.as_secs_f64(),
                restarts
            );
            tokio::select! {
                _ = shutdown_rx.wait_for(|stop| *stop) => return interrupted(target),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One poll-to-pipeline cycle. The checkout lock is held only while the
    /// pipeline runs and is released when this future completes or is dropped.
    async fn attempt(&self, target: &Target) -> Result<Order, PursuitFault> {
        let outcome = self
            .poller
            .wait_until_purchasable(target)
            .await
            .map_err(|error| PursuitFault {
                stage: PursuitStage::Availability,
                error,
            })?;
        debug!(
            "Item {} purchasable after {} quer(ies)",
            target, outcome.queries
        );

        let wait_started = Instant::now();
        let _guard = self.checkout_lock.lock().await;
        CHECKOUT_LOCK_WAIT.observe(wait_started.elapsed().as_secs_f64());
        debug!("Checkout lock acquired for item {}", target);

        let order = self.pipeline.run(target).await?;
        Ok(order)
    }
}

/// 1-based attempt number after `restarts` restarts. Saturates at `u32::MAX`.
fn attempt_number(restarts: u32) -> u32 {
    restarts.saturating_add(1)
}

fn interrupted(target: &Target) -> PursuitResult {
    info!("Pursuit of item {} interrupted", target);
    PursuitResult::Aborted {
        reason: AbortReason::Interrupted,
    }
}

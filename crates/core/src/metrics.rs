//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Availability polling
//! - Checkout pipeline (attempts, step failures, lock contention)
//! - Pursuit lifecycle (restarts, completed orders)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

// =============================================================================
// Availability
// =============================================================================

/// Availability queries by outcome.
pub static AVAILABILITY_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "restock_availability_polls_total",
            "Total availability queries",
        ),
        &["result"], // "available", "unavailable", "error"
    )
    .unwrap()
});

// =============================================================================
// Checkout
// =============================================================================

/// Pipeline runs started (one per lock acquisition).
pub static CHECKOUT_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("restock_checkout_attempts_total", "Total checkout pipeline runs").unwrap()
});

/// Add-to-cart calls made while reserving.
pub static CART_RESERVE_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "restock_cart_reserve_attempts_total",
        "Total add-to-cart calls",
    )
    .unwrap()
});

/// Pipeline failures by step and fault kind.
pub static CHECKOUT_STEP_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "restock_checkout_step_failures_total",
            "Checkout pipeline failures",
        ),
        &["step", "kind"],
    )
    .unwrap()
});

/// Pipeline duration in seconds.
pub static CHECKOUT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "restock_checkout_duration_seconds",
            "Duration of checkout pipeline runs",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Time spent waiting for the checkout lock.
pub static CHECKOUT_LOCK_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "restock_checkout_lock_wait_seconds",
            "Time a pursuit waited for the checkout lock",
        )
        .buckets(vec![0.001, 0.01, 0.1, 1.0, 5.0, 15.0, 60.0, 300.0]),
    )
    .unwrap()
});

// =============================================================================
// Pursuits
// =============================================================================

/// Pursuit restarts after a fault.
pub static PURSUIT_RESTARTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("restock_pursuit_restarts_total", "Total pursuit restarts"),
        &["kind"], // "expected", "unexpected"
    )
    .unwrap()
});

/// Orders placed.
pub static ORDERS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("restock_orders_completed_total", "Total orders completed").unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(AVAILABILITY_POLLS.clone()),
        Box::new(CHECKOUT_ATTEMPTS.clone()),
        Box::new(CART_RESERVE_ATTEMPTS.clone()),
        Box::new(CHECKOUT_STEP_FAILURES.clone()),
        Box::new(CHECKOUT_DURATION.clone()),
        Box::new(CHECKOUT_LOCK_WAIT.clone()),
        Box::new(PURSUIT_RESTARTS.clone()),
        Box::new(ORDERS_COMPLETED.clone()),
    ]
}

/// Register every core metric in `registry`.
pub fn register_all(registry: &Registry) -> prometheus::Result<()> {
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(())
}

/// Render a registry in the Prometheus text format.
pub fn render(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    if TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .is_err()
    {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_core_metrics() {
        let registry = Registry::new();
        register_all(&registry).unwrap();
        ORDERS_COMPLETED.inc_by(0);
        CHECKOUT_STEP_FAILURES
            .with_label_values(&["set_shipping", "api"])
            .inc();

        let text = render(&registry);
        assert!(text.contains("restock_orders_completed_total"));
        assert!(text.contains("restock_checkout_step_failures_total"));
    }
}

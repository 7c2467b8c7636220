//! Checkout pipeline.
//!
//! Drives one reserved item from an empty cart to a placed order. Steps run
//! strictly in [`CheckoutStep::SEQUENCE`] order and each one receives the
//! order produced by its predecessor. The caller is responsible for holding
//! the checkout lock while the pipeline runs.

mod pipeline;
mod types;

pub use pipeline::CheckoutPipeline;
pub use types::{CheckoutSettings, CheckoutStep, StepFailure};

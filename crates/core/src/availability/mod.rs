//! Availability polling.

mod poller;

pub use poller::{AvailabilityPoller, PollOutcome};

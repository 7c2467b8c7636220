pub mod availability;
pub mod checkout;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod session;
pub mod storefront;
pub mod testing;
pub mod transport;

pub use availability::{AvailabilityPoller, PollOutcome};
pub use checkout::{CheckoutPipeline, CheckoutSettings, CheckoutStep, StepFailure};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use orchestrator::{
    AbortReason, OrchestratorError, PursuitConfig, PursuitOrchestrator, PursuitResult,
    PursuitSummary, RestartConfig, ShutdownHandle,
};
pub use session::{create_session_provider, SessionContext, SessionError, SessionProvider};
pub use storefront::{Order, StorefrontApi, StorefrontError, Target};
pub use transport::{HttpTransport, Transport, TransportError};

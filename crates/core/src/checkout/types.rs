//! Types for the checkout pipeline.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::storefront::{BrowserProfile, ShippingProfile, StorefrontError};

/// A step of the checkout pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    /// Add the item to the cart until the cart is non-empty.
    ReserveCart,
    /// Prime the checkout session and turn the cart into an order.
    InitCheckout,
    /// Reset the line item fulfillment and submit the shipping address.
    SetShipping,
    /// Recompute payment options and replace the in-memory order.
    RefreshPaymentOptions,
    ValidateOrder,
    /// Attach the primary stored card and billing address.
    SetPaymentMethod,
    /// Second payment refresh, after the card is attached.
    RefreshPaymentOptionsAfterPayment,
    /// 3-D Secure pre-lookup and card authentication.
    AuthorizePayment,
    CompleteCheckout,
}

impl CheckoutStep {
    /// Every step, in execution order.
    pub const SEQUENCE: [CheckoutStep; 9] = [
        CheckoutStep::ReserveCart,
        CheckoutStep::InitCheckout,
        CheckoutStep::SetShipping,
        CheckoutStep::RefreshPaymentOptions,
        CheckoutStep::ValidateOrder,
        CheckoutStep::SetPaymentMethod,
        CheckoutStep::RefreshPaymentOptionsAfterPayment,
        CheckoutStep::AuthorizePayment,
        CheckoutStep::CompleteCheckout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::ReserveCart => "reserve_cart",
            CheckoutStep::InitCheckout => "init_checkout",
            CheckoutStep::SetShipping => "set_shipping",
            CheckoutStep::RefreshPaymentOptions => "refresh_payment_options",
            CheckoutStep::ValidateOrder => "validate_order",
            CheckoutStep::SetPaymentMethod => "set_payment_method",
            CheckoutStep::RefreshPaymentOptionsAfterPayment => {
                "refresh_payment_options_after_payment"
            }
            CheckoutStep::AuthorizePayment => "authorize_payment",
            CheckoutStep::CompleteCheckout => "complete_checkout",
        }
    }

    /// 1-based position in the pipeline.
    pub fn position(&self) -> usize {
        Self::SEQUENCE
            .iter()
            .position(|step| step == self)
            .map_or(0, |idx| idx + 1)
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline run that stopped at `step`.
#[derive(Debug, Error)]
#[error("checkout step {step} failed: {error}")]
pub struct StepFailure {
    pub step: CheckoutStep,
    #[source]
    pub error: StorefrontError,
}

/// Per-account data the pipeline submits to the storefront.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Card verification code sent with the primary card.
    pub cvv: String,
    pub shipping: ShippingProfile,
    pub browser: BrowserProfile,
    /// Pause between add-to-cart attempts while the cart is still empty.
    /// Zero retries immediately, yielding to other tasks in between.
    pub reserve_retry_delay: Duration,
}

impl CheckoutSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let cvv = config
            .account
            .cvv
            .clone()
            .filter(|cvv| !cvv.trim().is_empty())
            .ok_or_else(|| ConfigError::ValidationError("account.cvv must be set".to_string()))?;

        Ok(Self {
            cvv,
            shipping: config.shipping.clone(),
            browser: config.browser.clone(),
            reserve_retry_delay: Duration::from_millis(config.pursuit.reserve_retry_delay_ms),
        })
    }
}

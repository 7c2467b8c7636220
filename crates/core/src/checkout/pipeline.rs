//! Checkout pipeline implementation.

use std::future::Future;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::metrics::{
    CART_RESERVE_ATTEMPTS, CHECKOUT_ATTEMPTS, CHECKOUT_DURATION, CHECKOUT_STEP_FAILURES,
};
use crate::storefront::{
    billing_address_payload, credit_card_payload, select_primary_card, Order,
    PaymentMethodPayload, ShippingAddressPayload, StorefrontApi, StorefrontError, Target,
};

use super::types::{CheckoutSettings, CheckoutStep, StepFailure};

/// Runs the checkout steps for one target against the storefront.
#[derive(Clone)]
pub struct CheckoutPipeline {
    api: StorefrontApi,
    settings: CheckoutSettings,
}

impl CheckoutPipeline {
    pub fn new(api: StorefrontApi, settings: CheckoutSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Run every step in order, returning the placed order.
    ///
    /// Stops at the first failing step. Must be called with the checkout lock
    /// held: every step after [`CheckoutStep::ReserveCart`] mutates the
    /// account's single cart/order.
    pub async fn run(&self, target: &Target) -> Result<Order, StepFailure> {
        CHECKOUT_ATTEMPTS.inc();
        let started = Instant::now();

        let result = self.run_steps(target).await;

        let outcome = if result.is_ok() { "completed" } else { "failed" };
        CHECKOUT_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    async fn run_steps(&self, target: &Target) -> Result<Order, StepFailure> {
        track(CheckoutStep::ReserveCart, self.reserve_cart(target)).await?;
        let order = track(CheckoutStep::InitCheckout, self.init_checkout()).await?;
        let order = track(CheckoutStep::SetShipping, self.set_shipping(order)).await?;
        let order = track(
            CheckoutStep::RefreshPaymentOptions,
            self.refresh_payment_options(order),
        )
        .await?;
        let order = track(CheckoutStep::ValidateOrder, self.validate_order(order)).await?;
        let order = track(CheckoutStep::SetPaymentMethod, self.set_payment_method(order)).await?;
        let order = track(
            CheckoutStep::RefreshPaymentOptionsAfterPayment,
            self.refresh_payment_options(order),
        )
        .await?;
        let order = track(CheckoutStep::AuthorizePayment, self.authorize_payment(order)).await?;
        track(CheckoutStep::CompleteCheckout, self.complete_checkout(order)).await
    }

    /// Add `target` to the cart until the storefront reports a non-empty cart.
    ///
    /// There is no attempt limit; a request fault ends the step.
    pub async fn reserve_cart(&self, target: &Target) -> Result<(), StorefrontError> {
        loop {
            CART_RESERVE_ATTEMPTS.inc();
            let cart_count = self.api.add_to_cart(target).await?;
            if cart_count > 0 {
                info!("Item {} added to cart", target);
                return Ok(());
            }

            debug!("Cart still empty after adding {}, retrying", target);
            if self.settings.reserve_retry_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.settings.reserve_retry_delay).await;
            }
        }
    }

    /// Prime the checkout session, then create the order from the cart.
    pub async fn init_checkout(&self) -> Result<Order, StorefrontError> {
        self.api.prime_checkout().await?;
        let order = self.api.start_checkout().await?;
        debug!("Started checkout, order {}", order.id);
        Ok(order)
    }

    pub async fn set_shipping(&self, order: Order) -> Result<Order, StorefrontError> {
        let line_item_id = order.first_line_item_id()?;
        self.api.reset_fulfillment(&order.id, line_item_id).await?;

        let address = ShippingAddressPayload::from(&self.settings.shipping);
        self.api
            .set_shipping_address(&order.id, line_item_id, &address)
            .await?;
        Ok(order)
    }

    /// The refreshed order replaces the one passed in.
    pub async fn refresh_payment_options(&self, order: Order) -> Result<Order, StorefrontError> {
        self.api.refresh_payment_options(&order.id).await
    }

    pub async fn validate_order(&self, order: Order) -> Result<Order, StorefrontError> {
        self.api.validate_order(&order.id).await?;
        Ok(order)
    }

    pub async fn set_payment_method(&self, order: Order) -> Result<Order, StorefrontError> {
        let payment_id = order.payment_id()?;
        let context_id = order.customer_order_id()?;

        let card = select_primary_card(self.api.stored_cards().await?)?;
        debug!("Paying order {} with {} card {}", order.id, card.card_type, card.id);

        let payload = PaymentMethodPayload {
            credit_card: credit_card_payload(&order, &card, &self.settings.cvv)?,
            billing_address: billing_address_payload(&order, &self.settings.shipping),
        };
        self.api
            .set_credit_card(payment_id, context_id, &payload)
            .await?;
        Ok(order)
    }

    pub async fn authorize_payment(&self, order: Order) -> Result<Order, StorefrontError> {
        let payment_id = order.payment_id()?;
        let context_id = order.customer_order_id()?;
        let reference_id = self
            .api
            .three_ds_pre_lookup(payment_id, context_id, &order.id, &self.settings.browser)
            .await?;
        self.api
            .submit_card_authentication(&order.id, &reference_id)
            .await?;
        Ok(order)
    }

    pub async fn complete_checkout(&self, order: Order) -> Result<Order, StorefrontError> {
        self.api
            .complete_order(&order.id, &self.settings.browser)
            .await?;
        Ok(order)
    }
}

/// Run one step, tagging a failure with the step that produced it.
async fn track<T>(
    step: CheckoutStep,
    fut: impl Future<Output = Result<T, StorefrontError>>,
) -> Result<T, StepFailure> {
    debug!("Checkout step {}/{}: {}", step.position(), CheckoutStep::SEQUENCE.len(), step);
    fut.await.map_err(|error| {
        CHECKOUT_STEP_FAILURES
            .with_label_values(&[step.as_str(), error.kind()])
            .inc();
        StepFailure { step, error }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::storefront::Endpoint;
    use crate::testing::{fixtures, MockStorefront};

    fn pipeline(mock: &Arc<MockStorefront>) -> CheckoutPipeline {
        CheckoutPipeline::new(
            StorefrontApi::new(mock.clone()),
            fixtures::checkout_settings(),
        )
    }

    #[tokio::test]
    async fn test_run_calls_endpoints_in_order() {
        let mock = Arc::new(MockStorefront::new());
        let order = pipeline(&mock).run(&Target::from("6436919")).await.unwrap();

        assert_eq!(order.id, "O-6436919");
        assert_eq!(
            mock.endpoints().await,
            vec![
                Endpoint::AddToCart,
                Endpoint::FastTrack,
                Endpoint::StartCheckout,
                Endpoint::ResetFulfillment,
                Endpoint::SetShippingAddress,
                Endpoint::RefreshPayment,
                Endpoint::ValidateOrder,
                Endpoint::StoredCards,
                Endpoint::SetCreditCard,
                Endpoint::RefreshPayment,
                Endpoint::ThreeDsPreLookup,
                Endpoint::SubmitCardAuthentication,
                Endpoint::CompleteOrder,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reserve_cart_retries_until_non_empty() {
        let mock = Arc::new(MockStorefront::new());
        mock.set_empty_cart_adds(3).await;

        let started = Instant::now();
        pipeline(&mock)
            .reserve_cart(&Target::from("1"))
            .await
            .unwrap();

        assert_eq!(mock.call_count(Endpoint::AddToCart).await, 4);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_reserve_cart_without_delay() {
        let mock = Arc::new(MockStorefront::new());
        mock.set_empty_cart_adds(2).await;
        let mut settings = fixtures::checkout_settings();
        settings.reserve_retry_delay = Duration::ZERO;

        CheckoutPipeline::new(StorefrontApi::new(mock.clone()), settings)
            .reserve_cart(&Target::from("1"))
            .await
            .unwrap();
        assert_eq!(mock.call_count(Endpoint::AddToCart).await, 3);
    }

    #[tokio::test]
    async fn test_failure_names_step_and_stops() {
        let mock = Arc::new(MockStorefront::new());
        mock.fail_next(Endpoint::ValidateOrder, 409, 1).await;

        let failure = pipeline(&mock)
            .run(&Target::from("1"))
            .await
            .unwrap_err();

        assert_eq!(failure.step, CheckoutStep::ValidateOrder);
        assert!(failure.error.is_expected());
        assert_eq!(mock.call_count(Endpoint::StoredCards).await, 0);
        assert_eq!(mock.call_count(Endpoint::CompleteOrder).await, 0);
    }

    #[tokio::test]
    async fn test_missing_primary_card_is_unexpected() {
        let mock = Arc::new(MockStorefront::new());
        mock.set_missing_primary_card_for(1).await;

        let failure = pipeline(&mock)
            .run(&Target::from("1"))
            .await
            .unwrap_err();

        assert_eq!(failure.step, CheckoutStep::SetPaymentMethod);
        assert!(matches!(failure.error, StorefrontError::NoPrimaryCard));
        assert!(!failure.error.is_expected());
        assert_eq!(mock.call_count(Endpoint::SetCreditCard).await, 0);
    }

    #[tokio::test]
    async fn test_set_shipping_requires_line_item() {
        let mock = Arc::new(MockStorefront::new());
        let order: Order = serde_json::from_value(serde_json::json!({"id": "O1"})).unwrap();

        let err = pipeline(&mock).set_shipping(order).await.unwrap_err();
        assert!(matches!(err, StorefrontError::MissingField("lineItems[0].id")));
        assert_eq!(mock.call_count(Endpoint::ResetFulfillment).await, 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_order() {
        let mock = Arc::new(MockStorefront::new());
        mock.set_response(
            Endpoint::RefreshPayment,
            fixtures::order_json("O1", "L2", "P2", "C2"),
        )
        .await;
        let order: Order =
            serde_json::from_value(fixtures::order_json("O1", "L1", "P1", "C1")).unwrap();

        let refreshed = pipeline(&mock).refresh_payment_options(order).await.unwrap();
        assert_eq!(refreshed.payment_id().unwrap(), "P2");
        assert_eq!(refreshed.first_line_item_id().unwrap(), "L2");
    }

    #[tokio::test]
    async fn test_partial_billing_address_fails_refresh() {
        let mock = Arc::new(MockStorefront::new());
        let mut refreshed = fixtures::order_json("O1", "L1", "P1", "C1");
        refreshed["paymentMethods"] = serde_json::json!({
            "creditCard": {"binNumber": "411111"},
            "billingAddress": {"firstName": "John"}
        });
        mock.set_response(Endpoint::RefreshPayment, refreshed).await;

        let failure = pipeline(&mock)
            .run(&Target::from("1"))
            .await
            .unwrap_err();

        assert_eq!(failure.step, CheckoutStep::RefreshPaymentOptions);
        assert!(matches!(
            failure.error,
            StorefrontError::Decode { context: "refresh payment", .. }
        ));
        assert!(!failure.error.is_expected());
        assert_eq!(mock.call_count(Endpoint::SetCreditCard).await, 0);
    }

    #[tokio::test]
    async fn test_authorize_payment_forwards_reference_id() {
        let mock = Arc::new(MockStorefront::new());
        let order: Order =
            serde_json::from_value(fixtures::order_json("O1", "L1", "P1", "C1")).unwrap();

        pipeline(&mock).authorize_payment(order).await.unwrap();

        let calls = mock.calls().await;
        let submit = calls
            .iter()
            .find(|c| c.endpoint == Some(Endpoint::SubmitCardAuthentication))
            .unwrap();
        let body = submit.request.body.as_ref().unwrap();
        assert_eq!(body["orderId"], "O1");
        assert_eq!(
            body["threeDSecureStatus"]["threeDSReferenceId"],
            "3DS-P1"
        );
    }
}

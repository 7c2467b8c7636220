//! Typed storefront API on top of a [`Transport`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::transport::{ApiRequest, ApiResponse, Transport};

use super::endpoints;
use super::payloads::{PaymentMethodPayload, ShippingAddressPayload};
use super::types::{BrowserProfile, Order, StoredCard, StorefrontError, Target};

/// Button state that means the item can be added to the cart.
const PURCHASABLE_STATE: &str = "ADD_TO_CART";

/// Client name the payment service expects in `x-client`.
const CHECKOUT_CLIENT: &str = "CHECKOUT";

#[derive(Debug, Deserialize)]
struct PriceBlock {
    sku: PriceBlockSku,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceBlockSku {
    button_state: ButtonState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ButtonState {
    button_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartResponse {
    cart_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartCheckoutResponse {
    update_data: UpdateData,
}

#[derive(Debug, Deserialize)]
struct UpdateData {
    order: Order,
}

#[derive(Debug, Deserialize)]
struct PreLookupResponse {
    #[serde(rename = "threeDSReferenceId")]
    three_ds_reference_id: String,
}

/// Storefront operations used by the poller and the checkout pipeline.
#[derive(Clone)]
pub struct StorefrontApi {
    transport: Arc<dyn Transport>,
}

impl StorefrontApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, StorefrontError> {
        Ok(self.transport.execute(request).await?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        context: &'static str,
    ) -> Result<T, StorefrontError> {
        let response = self.send(request).await?;
        response
            .json()
            .map_err(|source| StorefrontError::Decode { context, source })
    }

    /// Whether `target` can currently be added to the cart.
    pub async fn is_purchasable(&self, target: &Target) -> Result<bool, StorefrontError> {
        let blocks: Vec<PriceBlock> = self
            .send_json(ApiRequest::get(endpoints::price_blocks(target.sku())), "price blocks")
            .await?;

        let block = blocks
            .into_iter()
            .next()
            .ok_or(StorefrontError::MissingField("priceBlocks[0]"))?;

        debug!("Item {} button state: {}", target, block.sku.button_state.button_state);
        Ok(block.sku.button_state.button_state == PURCHASABLE_STATE)
    }

    /// Add one unit of `target` to the cart, returning the cart count.
    pub async fn add_to_cart(&self, target: &Target) -> Result<u32, StorefrontError> {
        let request = ApiRequest::post(endpoints::ADD_TO_CART)
            .json(&json!({ "items": [{ "skuId": target.sku() }] }))?;
        let response: AddToCartResponse = self.send_json(request, "add to cart").await?;
        Ok(response.cart_count)
    }

    /// Visit the fast-track checkout page; the storefront uses it to set up
    /// checkout cookies.
    pub async fn prime_checkout(&self) -> Result<(), StorefrontError> {
        self.send(ApiRequest::get(endpoints::FAST_TRACK)).await?;
        Ok(())
    }

    /// Turn the cart into a checkout order.
    pub async fn start_checkout(&self) -> Result<Order, StorefrontError> {
        let response: StartCheckoutResponse = self
            .send_json(ApiRequest::post(endpoints::START_CHECKOUT), "start checkout")
            .await?;
        Ok(response.update_data.order)
    }

    /// Clear the fulfillment selection of a line item.
    pub async fn reset_fulfillment(
        &self,
        order_id: &str,
        line_item_id: &str,
    ) -> Result<(), StorefrontError> {
        let request = ApiRequest::patch(endpoints::order_items(order_id)).json(&json!([{
            "id": line_item_id,
            "selectedFulfillment": { "shipping": {} }
        }]))?;
        self.send(request).await?;
        Ok(())
    }

    /// Ship a line item to `address`.
    pub async fn set_shipping_address(
        &self,
        order_id: &str,
        line_item_id: &str,
        address: &ShippingAddressPayload,
    ) -> Result<(), StorefrontError> {
        let request = ApiRequest::patch(endpoints::order(order_id)).json(&json!({
            "items": [{
                "giftMessageSelected": false,
                "id": line_item_id,
                "type": "DEFAULT",
                "selectedFulfillment": { "shipping": { "address": address } }
            }]
        }))?;
        self.send(request).await?;
        Ok(())
    }

    /// Recompute payment options; the response is the complete order.
    pub async fn refresh_payment_options(&self, order_id: &str) -> Result<Order, StorefrontError> {
        let request = ApiRequest::post(endpoints::refresh_payment(order_id)).json(&json!({}))?;
        self.send_json(request, "refresh payment").await
    }

    pub async fn validate_order(&self, order_id: &str) -> Result<(), StorefrontError> {
        self.send(ApiRequest::post(endpoints::validate_order(order_id)))
            .await?;
        Ok(())
    }

    /// Payment instruments stored on the account profile.
    pub async fn stored_cards(&self) -> Result<Vec<StoredCard>, StorefrontError> {
        self.send_json(ApiRequest::get(endpoints::STORED_CARDS), "stored cards")
            .await
    }

    /// Attach a credit card and billing address to the order's payment.
    pub async fn set_credit_card(
        &self,
        payment_id: &str,
        context_id: &str,
        payload: &PaymentMethodPayload,
    ) -> Result<(), StorefrontError> {
        let request = ApiRequest::put(endpoints::credit_card(payment_id))
            .header("x-context-id", context_id)
            .header("x-client", CHECKOUT_CLIENT)
            .json(payload)?;
        self.send(request).await?;
        Ok(())
    }

    /// Submit the browser description, returning the one-time 3-D Secure
    /// reference id.
    pub async fn three_ds_pre_lookup(
        &self,
        payment_id: &str,
        context_id: &str,
        order_id: &str,
        browser: &BrowserProfile,
    ) -> Result<String, StorefrontError> {
        let request = ApiRequest::post(endpoints::three_ds_pre_lookup(payment_id))
            .header("x-context-id", context_id)
            .header("x-client", CHECKOUT_CLIENT)
            .json(&json!({ "orderId": order_id, "browserInfo": browser }))?;
        let response: PreLookupResponse = self.send_json(request, "3-D Secure pre-lookup").await?;
        Ok(response.three_ds_reference_id)
    }

    pub async fn submit_card_authentication(
        &self,
        order_id: &str,
        reference_id: &str,
    ) -> Result<(), StorefrontError> {
        let request = ApiRequest::post(endpoints::SUBMIT_CARD_AUTHENTICATION).json(&json!({
            "orderId": order_id,
            "threeDSecureStatus": { "threeDSReferenceId": reference_id }
        }))?;
        self.send(request).await?;
        Ok(())
    }

    /// Place the order.
    pub async fn complete_order(
        &self,
        order_id: &str,
        browser: &BrowserProfile,
    ) -> Result<(), StorefrontError> {
        let request =
            ApiRequest::post(endpoints::order(order_id)).json(&json!({ "browserInfo": browser }))?;
        self.send(request).await?;
        Ok(())
    }
}

//! Mock storefront for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::storefront::Endpoint;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

use super::fixtures;

const MOCK_BASE_URL: &str = "https://mock.storefront";

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Endpoint the request was routed to, `None` for unknown paths.
    pub endpoint: Option<Endpoint>,
    pub request: ApiRequest,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    unavailable_polls: u32,
    empty_cart_adds: u32,
    missing_primary_card: u32,
    /// Injected failures: status and remaining count.
    faults: HashMap<Endpoint, (u16, u32)>,
    responses: HashMap<Endpoint, Value>,
    orders_by_sku: HashMap<String, Value>,
    latency: Duration,
    cart_sku: Option<String>,
    current_order: Option<Value>,
    /// SKU whose checkout has started but not yet finished.
    in_flight: Option<String>,
    overlap: bool,
    completed: Vec<String>,
}

/// Mock implementation of the Transport trait that behaves like the
/// storefront's checkout API.
///
/// Provides controllable behavior for testing:
/// - Record every request for sequencing assertions
/// - Control availability and cart answers
/// - Inject HTTP failures per endpoint
/// - Detect two checkouts running at the same time
///
/// # Example
///
/// ```rust,ignore
/// let mock = Arc::new(MockStorefront::new());
/// mock.set_unavailable_polls(2).await;
/// mock.fail_next(Endpoint::SetShippingAddress, 500, 1).await;
///
/// let api = StorefrontApi::new(mock.clone());
/// // ... run a pursuit ...
///
/// assert_eq!(mock.call_count(Endpoint::PriceBlocks).await, 4);
/// assert!(!mock.overlap_detected().await);
/// ```
#[derive(Debug, Default)]
pub struct MockStorefront {
    state: Mutex<MockState>,
}

impl MockStorefront {
    /// Create a mock where every item is available and every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next `n` availability queries with a sold-out button state.
    pub async fn set_unavailable_polls(&self, n: u32) {
        self.state.lock().await.unavailable_polls = n;
    }

    /// Report an empty cart for the next `n` add-to-cart calls.
    pub async fn set_empty_cart_adds(&self, n: u32) {
        self.state.lock().await.empty_cart_adds = n;
    }

    /// Fail the next `times` calls to `endpoint` with HTTP `status`.
    pub async fn fail_next(&self, endpoint: Endpoint, status: u16, times: u32) {
        self.state
            .lock()
            .await
            .faults
            .insert(endpoint, (status, times));
    }

    /// Always answer `endpoint` with `body`.
    pub async fn set_response(&self, endpoint: Endpoint, body: Value) {
        self.state.lock().await.responses.insert(endpoint, body);
    }

    /// Order created when checkout starts for `sku`.
    ///
    /// Defaults to ids derived from the SKU (`O-{sku}`, `P-{sku}`, ...).
    pub async fn set_order_for(&self, sku: &str, order: Value) {
        self.state
            .lock()
            .await
            .orders_by_sku
            .insert(sku.to_string(), order);
    }

    /// Return a card list without a primary card for the next `n` lookups.
    pub async fn set_missing_primary_card_for(&self, n: u32) {
        self.state.lock().await.missing_primary_card = n;
    }

    /// Delay every response by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = latency;
    }

    /// Get all recorded requests, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    /// Endpoints hit so far, in order. Unknown paths are skipped.
    pub async fn endpoints(&self) -> Vec<Endpoint> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| call.endpoint)
            .collect()
    }

    pub async fn call_count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.endpoint == Some(endpoint))
            .count()
    }

    /// Ids of the orders placed so far.
    pub async fn completed_orders(&self) -> Vec<String> {
        self.state.lock().await.completed.clone()
    }

    /// Whether a cart was filled for one item while another item's checkout
    /// was still in progress.
    pub async fn overlap_detected(&self) -> bool {
        self.state.lock().await.overlap
    }

    fn respond(state: &mut MockState, endpoint: Endpoint, request: &ApiRequest) -> ApiResponse {
        if let Some(body) = state.responses.get(&endpoint) {
            return ApiResponse::ok_json(body);
        }

        let body = match endpoint {
            Endpoint::PriceBlocks => {
                let sku = query_param(&request.path, "skus").unwrap_or_default();
                let button_state = if state.unavailable_polls > 0 {
                    state.unavailable_polls -= 1;
                    "SOLD_OUT"
                } else {
                    "ADD_TO_CART"
                };
                json!([{ "sku": { "skuId": sku, "buttonState": { "buttonState": button_state } } }])
            }
            Endpoint::AddToCart => {
                let sku = request
                    .body
                    .as_ref()
                    .and_then(|b| b["items"][0]["skuId"].as_str())
                    .unwrap_or_default()
                    .to_string();

                match &state.in_flight {
                    Some(other) if *other != sku => state.overlap = true,
                    _ => {}
                }
                state.in_flight = Some(sku.clone());
                state.cart_sku = Some(sku);

                let cart_count = if state.empty_cart_adds > 0 {
                    state.empty_cart_adds -= 1;
                    0
                } else {
                    1
                };
                json!({ "cartCount": cart_count })
            }
            Endpoint::StartCheckout => {
                let sku = state.cart_sku.clone().unwrap_or_default();
                let order = state.orders_by_sku.get(&sku).cloned().unwrap_or_else(|| {
                    fixtures::order_json(
                        &format!("O-{}", sku),
                        &format!("L-{}", sku),
                        &format!("P-{}", sku),
                        &format!("C-{}", sku),
                    )
                });
                state.current_order = Some(order.clone());
                json!({ "updateData": { "order": order } })
            }
            Endpoint::RefreshPayment => {
                let mut order = state
                    .current_order
                    .clone()
                    .unwrap_or_else(|| json!({ "id": path_segment(&request.path, 2) }));
                if let Some(fields) = order.as_object_mut() {
                    fields.insert("paymentMethods".to_string(), fixtures::payment_methods_json());
                }
                order
            }
            Endpoint::StoredCards => {
                if state.missing_primary_card > 0 {
                    state.missing_primary_card -= 1;
                    state.in_flight = None;
                    let mut card = fixtures::primary_card_json();
                    card["primary"] = json!(false);
                    json!([card])
                } else {
                    json!([fixtures::primary_card_json()])
                }
            }
            Endpoint::ThreeDsPreLookup => {
                json!({ "threeDSReferenceId": format!("3DS-{}", path_segment(&request.path, 4)) })
            }
            Endpoint::CompleteOrder => {
                state.completed.push(path_segment(&request.path, 2));
                state.in_flight = None;
                json!({ "state": "SUBMITTED" })
            }
            Endpoint::FastTrack
            | Endpoint::ResetFulfillment
            | Endpoint::SetShippingAddress
            | Endpoint::ValidateOrder
            | Endpoint::SetCreditCard
            | Endpoint::SubmitCardAuthentication => json!({}),
        };

        ApiResponse::ok_json(&body)
    }
}

#[async_trait]
impl Transport for MockStorefront {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let latency = self.state.lock().await.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().await;
        let endpoint = Endpoint::classify(request.method, &request.path);
        state.calls.push(RecordedCall {
            endpoint,
            request: request.clone(),
        });

        let Some(endpoint) = endpoint else {
            return Err(status_error(&request, 404));
        };

        let injected = match state.faults.get_mut(&endpoint) {
            Some((status, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Some(*status)
            }
            _ => None,
        };
        if let Some(status) = injected {
            if endpoint != Endpoint::PriceBlocks {
                state.in_flight = None;
            }
            return Err(status_error(&request, status));
        }

        Ok(Self::respond(&mut state, endpoint, &request))
    }
}

fn status_error(request: &ApiRequest, status: u16) -> TransportError {
    TransportError::Status {
        status,
        method: request.method,
        url: format!("{}{}", MOCK_BASE_URL, request.path),
        request_body: request.body_text(),
        response_body: json!({ "errorCode": "MOCK_FAILURE" }).to_string(),
    }
}

fn path_segment(path: &str, index: usize) -> String {
    path.split('?')
        .next()
        .unwrap_or(path)
        .trim_start_matches('/')
        .split('/')
        .nth(index)
        .unwrap_or_default()
        .to_string()
}

fn query_param(path: &str, name: &str) -> Option<String> {
    let (_, query) = path.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

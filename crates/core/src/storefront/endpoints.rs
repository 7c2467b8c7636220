//! Storefront endpoint table.

use crate::transport::Method;

/// Every storefront call the checkout engine makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PriceBlocks,
    AddToCart,
    FastTrack,
    StartCheckout,
    ResetFulfillment,
    SetShippingAddress,
    RefreshPayment,
    ValidateOrder,
    StoredCards,
    SetCreditCard,
    ThreeDsPreLookup,
    SubmitCardAuthentication,
    CompleteOrder,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::PriceBlocks => "price_blocks",
            Endpoint::AddToCart => "add_to_cart",
            Endpoint::FastTrack => "fast_track",
            Endpoint::StartCheckout => "start_checkout",
            Endpoint::ResetFulfillment => "reset_fulfillment",
            Endpoint::SetShippingAddress => "set_shipping_address",
            Endpoint::RefreshPayment => "refresh_payment",
            Endpoint::ValidateOrder => "validate_order",
            Endpoint::StoredCards => "stored_cards",
            Endpoint::SetCreditCard => "set_credit_card",
            Endpoint::ThreeDsPreLookup => "three_ds_pre_lookup",
            Endpoint::SubmitCardAuthentication => "submit_card_authentication",
            Endpoint::CompleteOrder => "complete_order",
        }
    }

    /// Identify the endpoint a request targets.
    pub fn classify(method: Method, path: &str) -> Option<Endpoint> {
        let path = path.split('?').next().unwrap_or(path);
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        let endpoint = match (method, segments.as_slice()) {
            (Method::Get, ["api", "3.0", "priceBlocks"]) => Endpoint::PriceBlocks,
            (Method::Post, ["cart", "api", "v1", "addToCart"]) => Endpoint::AddToCart,
            (Method::Get, ["checkout", "r", "fast-track"]) => Endpoint::FastTrack,
            (Method::Post, ["cart", "checkout"]) => Endpoint::StartCheckout,
            (Method::Patch, ["checkout", "orders", _, "items"]) => Endpoint::ResetFulfillment,
            (Method::Patch, ["checkout", "orders", _]) => Endpoint::SetShippingAddress,
            (Method::Post, ["checkout", "orders", _, "paymentMethods", "refreshPayment"]) => {
                Endpoint::RefreshPayment
            }
            (Method::Post, ["checkout", "orders", _, "validate"]) => Endpoint::ValidateOrder,
            (Method::Get, ["profile", "rest", "c", "paymentinfo", "creditcard", "all"]) => {
                Endpoint::StoredCards
            }
            (Method::Put, ["payment", "api", "v1", "payment", _, "creditCard"]) => {
                Endpoint::SetCreditCard
            }
            (Method::Post, ["payment", "api", "v1", "payment", _, "threeDSecure", "preLookup"]) => {
                Endpoint::ThreeDsPreLookup
            }
            (Method::Post, ["checkout", "api", "1.0", "paysecure", "submitCardAuthentication"]) => {
                Endpoint::SubmitCardAuthentication
            }
            (Method::Post, ["checkout", "orders", _]) => Endpoint::CompleteOrder,
            _ => return None,
        };
        Some(endpoint)
    }
}

pub fn price_blocks(sku: &str) -> String {
    format!("/api/3.0/priceBlocks?skus={}", urlencoding::encode(sku))
}

pub const ADD_TO_CART: &str = "/cart/api/v1/addToCart";
pub const FAST_TRACK: &str = "/checkout/r/fast-track";
pub const START_CHECKOUT: &str = "/cart/checkout";
pub const STORED_CARDS: &str = "/profile/rest/c/paymentinfo/creditcard/all";
pub const SUBMIT_CARD_AUTHENTICATION: &str = "/checkout/api/1.0/paysecure/submitCardAuthentication";

pub fn order(order_id: &str) -> String {
    format!("/checkout/orders/{}", order_id)
}

pub fn order_items(order_id: &str) -> String {
    format!("/checkout/orders/{}/items", order_id)
}

pub fn refresh_payment(order_id: &str) -> String {
    format!("/checkout/orders/{}/paymentMethods/refreshPayment", order_id)
}

pub fn validate_order(order_id: &str) -> String {
    format!("/checkout/orders/{}/validate", order_id)
}

pub fn credit_card(payment_id: &str) -> String {
    format!("/payment/api/v1/payment/{}/creditCard", payment_id)
}

pub fn three_ds_pre_lookup(payment_id: &str) -> String {
    format!("/payment/api/v1/payment/{}/threeDSecure/preLookup", payment_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_round_trips_builders() {
        let cases = [
            (Method::Get, price_blocks("6436919"), Endpoint::PriceBlocks),
            (Method::Post, ADD_TO_CART.to_string(), Endpoint::AddToCart),
            (Method::Get, FAST_TRACK.to_string(), Endpoint::FastTrack),
            (Method::Post, START_CHECKOUT.to_string(), Endpoint::StartCheckout),
            (Method::Patch, order_items("O1"), Endpoint::ResetFulfillment),
            (Method::Patch, order("O1"), Endpoint::SetShippingAddress),
            (Method::Post, refresh_payment("O1"), Endpoint::RefreshPayment),
            (Method::Post, validate_order("O1"), Endpoint::ValidateOrder),
            (Method::Get, STORED_CARDS.to_string(), Endpoint::StoredCards),
            (Method::Put, credit_card("P1"), Endpoint::SetCreditCard),
            (Method::Post, three_ds_pre_lookup("P1"), Endpoint::ThreeDsPreLookup),
            (
                Method::Post,
                SUBMIT_CARD_AUTHENTICATION.to_string(),
                Endpoint::SubmitCardAuthentication,
            ),
            (Method::Post, order("O1"), Endpoint::CompleteOrder),
        ];

        for (method, path, expected) in cases {
            assert_eq!(Endpoint::classify(method, &path), Some(expected), "{}", path);
        }
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(Endpoint::classify(Method::Get, "/nope"), None);
        assert_eq!(Endpoint::classify(Method::Put, &order("O1")), None);
    }

    #[test]
    fn test_price_blocks_encodes_sku() {
        assert_eq!(price_blocks("a b"), "/api/3.0/priceBlocks?skus=a%20b");
    }
}

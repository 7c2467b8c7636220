//! Testing utilities and mock implementations.
//!
//! [`MockStorefront`] stands in for the retailer behind the [`Transport`]
//! trait, so the poller, the checkout pipeline and the orchestrator can be
//! exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use restock_core::testing::{fixtures, MockStorefront};
//!
//! let storefront = Arc::new(MockStorefront::new());
//! storefront.set_unavailable_polls(2).await;
//!
//! let orchestrator = PursuitOrchestrator::new(
//!     pursuit_config,
//!     storefront.clone(),
//!     fixtures::checkout_settings(),
//! );
//! ```
//!
//! [`Transport`]: crate::transport::Transport

mod mock_storefront;

pub use mock_storefront::{MockStorefront, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use serde_json::{json, Value};

    use crate::checkout::CheckoutSettings;
    use crate::storefront::{BrowserProfile, CardExpiration, ShippingProfile, StoredCard};

    /// A checkout order as returned by the storefront.
    pub fn order_json(id: &str, line_item_id: &str, payment_id: &str, customer_order_id: &str) -> Value {
        json!({
            "id": id,
            "customerOrderId": customer_order_id,
            "lineItems": [{
                "id": line_item_id,
                "selectedFulfillment": { "shipping": {} }
            }],
            "payment": { "id": payment_id },
            "state": "IN_PROGRESS"
        })
    }

    /// Payment metadata the storefront attaches after a payment refresh.
    pub fn payment_methods_json() -> Value {
        json!({
            "creditCard": {
                "binNumber": "411111",
                "paymentReferenceId": "REF-1"
            },
            "billingAddress": {
                "firstName": "Jane",
                "lastName": "Doe",
                "street": "100 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipcode": "62701",
                "country": "us",
                "dayPhoneNumber": "5555550100"
            }
        })
    }

    pub fn primary_card_json() -> Value {
        json!({
            "id": "CARD-1",
            "type": "VISA",
            "primary": true,
            "expirationDate": { "month": "04", "year": "2027" }
        })
    }

    pub fn primary_card() -> StoredCard {
        StoredCard {
            id: "CARD-1".to_string(),
            card_type: "VISA".to_string(),
            primary: true,
            expiration_date: CardExpiration {
                month: "04".to_string(),
                year: "2027".to_string(),
            },
        }
    }

    pub fn shipping_profile() -> ShippingProfile {
        ShippingProfile {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            middle_initial: String::new(),
            street: "100 Main St".to_string(),
            street2: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
            country: "US".to_string(),
            day_phone_number: "5555550100".to_string(),
            address_type: "RESIDENTIAL".to_string(),
        }
    }

    /// Settings with a 500ms reserve retry delay.
    pub fn checkout_settings() -> CheckoutSettings {
        CheckoutSettings {
            cvv: "123".to_string(),
            shipping: shipping_profile(),
            browser: BrowserProfile::default(),
            reserve_retry_delay: Duration::from_millis(500),
        }
    }
}

//! Storefront data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::de;
use crate::transport::TransportError;

/// Errors produced while talking to the storefront or interpreting its answers.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Non-success response or transport failure.
    #[error(transparent)]
    Api(#[from] TransportError),

    #[error("Failed to decode {context} response: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field in storefront data: {0}")]
    MissingField(&'static str),

    #[error("No primary payment instrument found on the account")]
    NoPrimaryCard,
}

impl StorefrontError {
    /// Expected faults come from the remote API; everything else is a
    /// parsing or lookup problem on our side.
    pub fn is_expected(&self) -> bool {
        matches!(self, StorefrontError::Api(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StorefrontError::Api(_) => "api",
            StorefrontError::Decode { .. } => "decode",
            StorefrontError::MissingField(_) => "missing_field",
            StorefrontError::NoPrimaryCard => "no_primary_card",
        }
    }
}

/// An item identifier (SKU) being pursued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(sku: impl Into<String>) -> Self {
        Self(sku.into())
    }

    pub fn sku(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(sku: &str) -> Self {
        Self::new(sku)
    }
}

impl From<String> for Target {
    fn from(sku: String) -> Self {
        Self(sku)
    }
}

/// Checkout order as mirrored from the storefront.
///
/// Only the fields the pipeline reads are modelled; the rest of the server
/// representation is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub customer_order_id: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub payment: Option<PaymentRef>,
    #[serde(default)]
    pub payment_methods: Option<PaymentMethods>,
}

impl Order {
    pub fn first_line_item_id(&self) -> Result<&str, StorefrontError> {
        self.line_items
            .first()
            .map(|item| item.id.as_str())
            .ok_or(StorefrontError::MissingField("lineItems[0].id"))
    }

    pub fn payment_id(&self) -> Result<&str, StorefrontError> {
        self.payment
            .as_ref()
            .map(|p| p.id.as_str())
            .ok_or(StorefrontError::MissingField("payment.id"))
    }

    pub fn customer_order_id(&self) -> Result<&str, StorefrontError> {
        self.customer_order_id
            .as_deref()
            .ok_or(StorefrontError::MissingField("customerOrderId"))
    }

    pub fn credit_card(&self) -> Option<&OrderCreditCard> {
        self.payment_methods.as_ref()?.credit_card.as_ref()
    }

    pub fn billing_address(&self) -> Option<&OrderAddress> {
        self.payment_methods.as_ref()?.billing_address.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_fulfillment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethods {
    #[serde(default)]
    pub credit_card: Option<OrderCreditCard>,
    #[serde(default)]
    pub billing_address: Option<OrderAddress>,
}

/// Card metadata the storefront attaches to the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreditCard {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub bin_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub payment_reference_id: Option<String>,
}

/// Billing address on file. Every field is required; an order without any
/// address falls back to the shipping profile instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub zipcode: String,
    pub country: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub day_phone_number: String,
}

/// Stored payment instrument from the account profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCard {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub primary: bool,
    pub expiration_date: CardExpiration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardExpiration {
    #[serde(deserialize_with = "de::string_or_number")]
    pub month: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub year: String,
}

/// Shipping address submitted during checkout, also used as billing address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_initial: String,
    pub street: String,
    #[serde(default)]
    pub street2: String,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub zipcode: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub day_phone_number: String,
    #[serde(default = "default_address_type")]
    pub address_type: String,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_address_type() -> String {
    "RESIDENTIAL".to_string()
}

/// Browser/device description sent with payment authorization and order
/// completion.
///
/// Read from config with snake_case keys, sent to the storefront in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), default)]
pub struct BrowserProfile {
    pub java_enabled: bool,
    pub language: String,
    pub user_agent: String,
    pub height: String,
    pub width: String,
    pub time_zone: String,
    pub color_depth: String,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            java_enabled: false,
            language: "en-US".to_string(),
            user_agent: crate::config::default_user_agent(),
            height: "1127".to_string(),
            width: "1127".to_string(),
            time_zone: "420".to_string(),
            color_depth: "24".to_string(),
        }
    }
}

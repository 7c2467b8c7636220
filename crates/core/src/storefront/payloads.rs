//! Request payloads composed by the checkout pipeline.

use serde::Serialize;

use super::types::{Order, OrderAddress, ShippingProfile, StorefrontError, StoredCard};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressPayload {
    pub country: String,
    pub save_to_profile: bool,
    pub street2: String,
    pub use_address_as_billing: bool,
    pub middle_initial: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    #[serde(rename = "override")]
    pub override_address: bool,
    pub zipcode: String,
    pub state: String,
    pub first_name: String,
    pub is_wish_list_address: bool,
    pub day_phone_number: String,
    #[serde(rename = "type")]
    pub address_type: String,
}

impl From<&ShippingProfile> for ShippingAddressPayload {
    fn from(profile: &ShippingProfile) -> Self {
        Self {
            country: profile.country.clone(),
            save_to_profile: false,
            street2: profile.street2.clone(),
            use_address_as_billing: true,
            middle_initial: profile.middle_initial.clone(),
            last_name: profile.last_name.clone(),
            street: profile.street.clone(),
            city: profile.city.clone(),
            override_address: false,
            zipcode: profile.zipcode.clone(),
            state: profile.state.clone(),
            first_name: profile.first_name.clone(),
            is_wish_list_address: false,
            day_phone_number: profile.day_phone_number.clone(),
            address_type: profile.address_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardPayload {
    pub bin_number: Option<String>,
    pub credit_card_profile_id: String,
    pub cvv: String,
    pub exp_month: String,
    pub exp_year: String,
    #[serde(rename = "hasCID")]
    pub has_cid: bool,
    pub invalid_card: bool,
    pub is_customer_card: bool,
    pub is_new_card: bool,
    #[serde(rename = "isPWPRegistered")]
    pub is_pwp_registered: bool,
    pub is_visa_checkout: bool,
    pub order_id: String,
    pub payment_reference_id: Option<String>,
    pub save_to_profile: bool,
    #[serde(rename = "type")]
    pub card_type: String,
    pub virtual_card: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddressPayload {
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub country: String,
    pub day_phone: String,
    pub first_name: String,
    pub is_wish_list_address: bool,
    pub last_name: String,
    pub middle_initial: String,
    pub postal_code: String,
    pub standardized: bool,
    pub state: String,
    pub use_address_as_billing: bool,
    pub user_overridden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodPayload {
    pub credit_card: CreditCardPayload,
    pub billing_address: BillingAddressPayload,
}

/// Pick the account's primary card.
pub fn select_primary_card(cards: Vec<StoredCard>) -> Result<StoredCard, StorefrontError> {
    cards
        .into_iter()
        .find(|card| card.primary)
        .ok_or(StorefrontError::NoPrimaryCard)
}

/// Merge the order's card metadata with the stored card and the configured CVV.
pub fn credit_card_payload(
    order: &Order,
    card: &StoredCard,
    cvv: &str,
) -> Result<CreditCardPayload, StorefrontError> {
    let order_card = order.credit_card().cloned().unwrap_or_default();

    Ok(CreditCardPayload {
        bin_number: order_card.bin_number,
        credit_card_profile_id: card.id.clone(),
        cvv: cvv.to_string(),
        exp_month: card.expiration_date.month.clone(),
        exp_year: card.expiration_date.year.clone(),
        has_cid: false,
        invalid_card: false,
        is_customer_card: false,
        is_new_card: false,
        is_pwp_registered: false,
        is_visa_checkout: false,
        order_id: order.customer_order_id()?.to_string(),
        payment_reference_id: order_card.payment_reference_id,
        save_to_profile: false,
        card_type: card.card_type.clone(),
        virtual_card: false,
    })
}

/// Billing address from the order, or from the shipping profile when the
/// order does not carry one yet.
pub fn billing_address_payload(order: &Order, fallback: &ShippingProfile) -> BillingAddressPayload {
    let address = order.billing_address().cloned().unwrap_or_else(|| OrderAddress {
        first_name: fallback.first_name.clone(),
        last_name: fallback.last_name.clone(),
        street: fallback.street.clone(),
        city: fallback.city.clone(),
        state: fallback.state.clone(),
        zipcode: fallback.zipcode.clone(),
        country: fallback.country.clone(),
        day_phone_number: fallback.day_phone_number.clone(),
    });

    BillingAddressPayload {
        address_line1: address.street,
        address_line2: String::new(),
        city: address.city,
        country: address.country.to_uppercase(),
        day_phone: address.day_phone_number,
        first_name: address.first_name,
        is_wish_list_address: false,
        last_name: address.last_name,
        middle_initial: String::new(),
        postal_code: address.zipcode,
        standardized: true,
        state: address.state,
        use_address_as_billing: true,
        user_overridden: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::CardExpiration;
    use serde_json::json;

    fn card(id: &str, primary: bool) -> StoredCard {
        StoredCard {
            id: id.to_string(),
            card_type: "VISA".to_string(),
            primary,
            expiration_date: CardExpiration {
                month: "04".to_string(),
                year: "2027".to_string(),
            },
        }
    }

    fn shipping() -> ShippingProfile {
        ShippingProfile {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            middle_initial: String::new(),
            street: "100 Main St".to_string(),
            street2: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
            country: "us".to_string(),
            day_phone_number: "5555550100".to_string(),
            address_type: "RESIDENTIAL".to_string(),
        }
    }

    fn order_with_payment_methods() -> Order {
        serde_json::from_value(json!({
            "id": "O1",
            "customerOrderId": "C1",
            "lineItems": [{"id": "L1"}],
            "payment": {"id": "P1"},
            "paymentMethods": {
                "creditCard": {"binNumber": "411111", "paymentReferenceId": "REF9"},
                "billingAddress": {
                    "firstName": "John", "lastName": "Roe", "street": "1 Elm",
                    "city": "Shelbyville", "state": "IL", "zipcode": "62565",
                    "country": "us", "dayPhoneNumber": "5555550199"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_select_primary_card() {
        let selected = select_primary_card(vec![card("a", false), card("b", true)]).unwrap();
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn test_select_primary_card_none_flagged() {
        let result = select_primary_card(vec![card("a", false)]);
        assert!(matches!(result, Err(StorefrontError::NoPrimaryCard)));
        assert!(select_primary_card(vec![]).is_err());
    }

    #[test]
    fn test_credit_card_payload_merges_order_and_profile() {
        let payload =
            credit_card_payload(&order_with_payment_methods(), &card("77", true), "123").unwrap();
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["binNumber"], "411111");
        assert_eq!(value["paymentReferenceId"], "REF9");
        assert_eq!(value["creditCardProfileId"], "77");
        assert_eq!(value["cvv"], "123");
        assert_eq!(value["expMonth"], "04");
        assert_eq!(value["orderId"], "C1");
        assert_eq!(value["type"], "VISA");
        assert_eq!(value["hasCID"], false);
        assert_eq!(value["isPWPRegistered"], false);
    }

    #[test]
    fn test_credit_card_payload_requires_customer_order_id() {
        let order: Order = serde_json::from_value(json!({"id": "O1"})).unwrap();
        let result = credit_card_payload(&order, &card("77", true), "123");
        assert!(matches!(
            result,
            Err(StorefrontError::MissingField("customerOrderId"))
        ));
    }

    #[test]
    fn test_billing_payload_from_order() {
        let payload = billing_address_payload(&order_with_payment_methods(), &shipping());
        assert_eq!(payload.address_line1, "1 Elm");
        assert_eq!(payload.country, "US");
        assert_eq!(payload.postal_code, "62565");
        assert_eq!(payload.day_phone, "5555550199");
    }

    #[test]
    fn test_billing_payload_falls_back_to_shipping_profile() {
        let order: Order = serde_json::from_value(json!({"id": "O1"})).unwrap();
        let payload = billing_address_payload(&order, &shipping());
        assert_eq!(payload.first_name, "Jane");
        assert_eq!(payload.country, "US");

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["addressLine1"], "100 Main St");
        assert_eq!(value["useAddressAsBilling"], true);
    }

    #[test]
    fn test_shipping_payload_wire_names() {
        let value = serde_json::to_value(ShippingAddressPayload::from(&shipping())).unwrap();
        assert_eq!(value["override"], false);
        assert_eq!(value["type"], "RESIDENTIAL");
        assert_eq!(value["useAddressAsBilling"], true);
        assert_eq!(value["dayPhoneNumber"], "5555550100");
    }
}

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Credential pair and card verification code are present
/// - At least one target is configured
/// - Shipping profile has no blank required fields
/// - Retailer base URL is http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let account = &config.account;

    for (field, value) in [
        ("account.username", &account.username),
        ("account.password", &account.password),
        ("account.cvv", &account.cvv),
    ] {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!("{} must be set", field)));
        }
    }

    if config.pursuit.targets.is_empty() {
        return Err(ConfigError::ValidationError(
            "pursuit.targets must list at least one item".to_string(),
        ));
    }

    let shipping = &config.shipping;
    for (field, value) in [
        ("shipping.first_name", &shipping.first_name),
        ("shipping.last_name", &shipping.last_name),
        ("shipping.street", &shipping.street),
        ("shipping.city", &shipping.city),
        ("shipping.state", &shipping.state),
        ("shipping.zipcode", &shipping.zipcode),
        ("shipping.day_phone_number", &shipping.day_phone_number),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
    }

    let base_url = &config.retailer.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "retailer.base_url must be an http(s) URL, got {}",
            base_url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[account]
username = "shopper@example.com"
password = "hunter2"
cvv = "123"

[pursuit]
targets = "6436919"

[shipping]
first_name = "Jane"
last_name = "Doe"
street = "100 Main St"
city = "Springfield"
state = "IL"
zipcode = "62701"
day_phone_number = "5555550100"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_password_fails() {
        let mut config = valid_config();
        config.account.password = None;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("account.password")));
    }

    #[test]
    fn test_validate_blank_cvv_fails() {
        let mut config = valid_config();
        config.account.cvv = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_targets_fails() {
        let mut config = valid_config();
        config.pursuit.targets.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pursuit.targets"));
    }

    #[test]
    fn test_validate_blank_shipping_field_fails() {
        let mut config = valid_config();
        config.shipping.zipcode = String::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("shipping.zipcode"));
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = valid_config();
        config.retailer.base_url = "www.example.com".to_string();
        assert!(validate_config(&config).is_err());
    }
}

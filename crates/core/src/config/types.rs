use serde::{Deserialize, Serialize};

use super::de;
use crate::orchestrator::PursuitConfig;
use crate::storefront::{BrowserProfile, ShippingProfile};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub account: AccountConfig,
    pub pursuit: PursuitConfig,
    pub shipping: ShippingProfile,
    #[serde(default)]
    pub retailer: RetailerConfig,
    #[serde(default)]
    pub browser: BrowserProfile,
}

/// Retailer account configuration
///
/// Credentials are optional at the parsing layer so that a missing value
/// surfaces as a validation error naming the field, not a generic parse error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub password: Option<String>,
    /// Card verification code submitted with the stored card.
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub cvv: Option<String>,
    /// Session cookie bundle, `name=value; name2=value2`.
    #[serde(default)]
    pub cookies: Option<String>,
}

/// Storefront connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetailerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for RetailerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.bestbuy.com".to_string()
}

pub(crate) fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/87.0.4280.88 Safari/537.36"
        .to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for log output (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub account: SanitizedAccountConfig,
    pub pursuit: PursuitConfig,
    pub retailer: RetailerConfig,
    pub shipping_city: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAccountConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_configured: bool,
    pub cvv_configured: bool,
    pub cookie_count: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let cookie_count = config
            .account
            .cookies
            .as_deref()
            .map(|c| c.split(';').filter(|p| !p.trim().is_empty()).count())
            .unwrap_or(0);

        Self {
            account: SanitizedAccountConfig {
                username: config.account.username.clone(),
                password_configured: config
                    .account
                    .password
                    .as_deref()
                    .is_some_and(|p| !p.is_empty()),
                cvv_configured: config.account.cvv.as_deref().is_some_and(|c| !c.is_empty()),
                cookie_count,
            },
            pursuit: config.pursuit.clone(),
            retailer: config.retailer.clone(),
            shipping_city: config.shipping.city.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[account]
username = "shopper@example.com"
password = "hunter2"
cvv = "123"
cookies = "SID=abc; ut=def"

[pursuit]
targets = "6436919,6430161"

[shipping]
first_name = "Jane"
last_name = "Doe"
street = "100 Main St"
city = "Springfield"
state = "IL"
zipcode = "62701"
day_phone_number = "5555550100"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.account.username.as_deref(), Some("shopper@example.com"));
        assert_eq!(config.pursuit.targets, vec!["6436919", "6430161"]);
        assert_eq!(config.pursuit.poll_interval_secs, 30);
        assert_eq!(config.retailer.base_url, "https://www.bestbuy.com");
        assert_eq!(config.retailer.timeout_secs, 30);
        assert_eq!(config.shipping.country, "US");
        assert_eq!(config.browser.language, "en-US");
    }

    #[test]
    fn test_deserialize_missing_shipping_fails() {
        let toml = r#"
[account]
username = "a"

[pursuit]
targets = ["1"]
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        assert!(sanitized.account.password_configured);
        assert!(sanitized.account.cvv_configured);
        assert_eq!(sanitized.account.cookie_count, 2);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("\"123\""));
        assert!(!json.contains("SID=abc"));
    }
}

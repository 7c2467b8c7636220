use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `RESTOCK_ACCOUNT__CVV`.
pub const ENV_PREFIX: &str = "RESTOCK_";

/// Environment keys whose values are taken verbatim. Figment parses `0123`
/// as the integer 123 otherwise.
const VERBATIM_ENV_KEYS: &[&str] = &[
    "account.username",
    "account.password",
    "account.cvv",
    "account.cookies",
    "pursuit.targets",
    "shipping.street",
    "shipping.street2",
    "shipping.zipcode",
    "shipping.day_phone_number",
    "browser.language",
    "browser.user_agent",
    "browser.height",
    "browser.width",
    "browser.time_zone",
    "browser.color_depth",
];

/// Load configuration from an optional file with environment variable overrides.
///
/// `None` means "environment only". A path that is given but does not exist is
/// an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let env = Env::prefixed(ENV_PREFIX).split("__");
    figment = figment.merge(env.clone());
    for (key, value) in env.iter() {
        if VERBATIM_ENV_KEYS.contains(&key.as_str()) {
            figment = figment.merge(Serialized::default(key.as_str(), value));
        }
    }

    let config: Config = figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
[account]
username = "shopper@example.com"
password = "hunter2"
cvv = "123"

[pursuit]
targets = ["6436919"]
poll_interval_secs = 10

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
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(CONFIG).unwrap();
        assert_eq!(config.pursuit.poll_interval_secs, 10);
        assert_eq!(config.pursuit.targets, vec!["6436919"]);
    }

    #[test]
    fn test_load_config_from_str_missing_pursuit() {
        let toml = r#"
[account]
username = "a"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Some(Path::new("/nonexistent/restock.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", CONFIG).unwrap();

        let config = load_config(Some(temp_file.path())).unwrap();
        assert_eq!(config.account.cvv.as_deref(), Some("123"));
        assert_eq!(config.shipping.city, "Springfield");
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("restock.toml", CONFIG)?;
            jail.set_env("RESTOCK_PURSUIT__TARGETS", "6436919,6430161");
            jail.set_env("RESTOCK_PURSUIT__POLL_INTERVAL_SECS", "5");
            jail.set_env("RESTOCK_ACCOUNT__USERNAME", "other@example.com");

            let config = load_config(Some(Path::new("restock.toml"))).unwrap();
            assert_eq!(config.pursuit.targets, vec!["6436919", "6430161"]);
            assert_eq!(config.pursuit.poll_interval_secs, 5);
            assert_eq!(config.account.username.as_deref(), Some("other@example.com"));
            Ok(())
        });
    }

    #[test]
    fn test_env_only_single_numeric_target() {
        Jail::expect_with(|jail| {
            jail.set_env("RESTOCK_ACCOUNT__USERNAME", "shopper@example.com");
            jail.set_env("RESTOCK_PURSUIT__TARGETS", "6436919");
            jail.set_env("RESTOCK_SHIPPING__FIRST_NAME", "Jane");
            jail.set_env("RESTOCK_SHIPPING__LAST_NAME", "Doe");
            jail.set_env("RESTOCK_SHIPPING__STREET", "100 Main St");
            jail.set_env("RESTOCK_SHIPPING__CITY", "Springfield");
            jail.set_env("RESTOCK_SHIPPING__STATE", "IL");
            jail.set_env("RESTOCK_SHIPPING__ZIPCODE", "62701");
            jail.set_env("RESTOCK_SHIPPING__DAY_PHONE_NUMBER", "5555550100");

            let config = load_config(None).unwrap();
            assert_eq!(config.pursuit.targets, vec!["6436919"]);
            assert_eq!(config.shipping.zipcode, "62701");
            assert!(config.account.password.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_env_keeps_leading_zeros() {
        Jail::expect_with(|jail| {
            jail.create_file("restock.toml", CONFIG)?;
            jail.set_env("RESTOCK_ACCOUNT__CVV", "0123");
            jail.set_env("RESTOCK_ACCOUNT__PASSWORD", "007");
            jail.set_env("RESTOCK_SHIPPING__ZIPCODE", "02108");
            jail.set_env("RESTOCK_SHIPPING__DAY_PHONE_NUMBER", "0555550100");
            jail.set_env("RESTOCK_PURSUIT__TARGETS", "0064369");
            jail.set_env("RESTOCK_BROWSER__TIME_ZONE", "0300");

            let config = load_config(Some(Path::new("restock.toml"))).unwrap();
            assert_eq!(config.account.cvv.as_deref(), Some("0123"));
            assert_eq!(config.account.password.as_deref(), Some("007"));
            assert_eq!(config.shipping.zipcode, "02108");
            assert_eq!(config.shipping.day_phone_number, "0555550100");
            assert_eq!(config.pursuit.targets, vec!["0064369"]);
            assert_eq!(config.browser.time_zone, "0300");
            Ok(())
        });
    }

    #[test]
    fn test_env_target_list_keeps_leading_zeros() {
        Jail::expect_with(|jail| {
            jail.create_file("restock.toml", CONFIG)?;
            jail.set_env("RESTOCK_PURSUIT__TARGETS", "0064369,6430161");

            let config = load_config(Some(Path::new("restock.toml"))).unwrap();
            assert_eq!(config.pursuit.targets, vec!["0064369", "6430161"]);
            assert_eq!(config.account.cvv.as_deref(), Some("123"));
            Ok(())
        });
    }
}

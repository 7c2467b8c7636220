mod cookie;
mod traits;
mod types;

pub use cookie::*;
pub use traits::*;
pub use types::*;

use crate::config::AccountConfig;

/// Factory function to create the session provider from config
pub fn create_session_provider(
    config: &AccountConfig,
) -> Result<Box<dyn SessionProvider>, SessionError> {
    Ok(Box::new(CookieSessionProvider::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_provider() {
        let config = AccountConfig {
            username: Some("shopper@example.com".to_string()),
            password: Some("hunter2".to_string()),
            cvv: Some("123".to_string()),
            cookies: Some("SID=abc".to_string()),
        };
        let provider = create_session_provider(&config).unwrap();
        assert_eq!(provider.method_name(), "cookie");
    }

    #[test]
    fn test_create_session_provider_missing_credentials() {
        let config = AccountConfig::default();
        let result = create_session_provider(&config);
        assert!(matches!(result, Err(SessionError::MissingCredentials(_))));
    }
}

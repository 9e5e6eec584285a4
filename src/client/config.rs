//! Client configuration.

use std::env;

use super::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Smallest amount, in naira, the funding form accepts
pub const MIN_FUNDING_AMOUNT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Gateway public key; funding is disabled without it
    pub paystack_public_key: Option<String>,
    pub min_funding_amount: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            paystack_public_key: None,
            min_funding_amount: MIN_FUNDING_AMOUNT,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.paystack_public_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    /// Read `FARMEELY_API_URL` and `PAYSTACK_PUBLIC_KEY`
    pub fn from_env() -> Result<Self, ClientError> {
        let api_base_url =
            env::var("FARMEELY_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "FARMEELY_API_URL must be an http(s) URL, got {}",
                api_base_url
            )));
        }

        let mut config = Self::new(api_base_url);
        if let Ok(key) = env::var("PAYSTACK_PUBLIC_KEY") {
            config = config.with_public_key(key);
        }
        Ok(config)
    }

    #[must_use]
    pub fn payments_enabled(&self) -> bool {
        self.paystack_public_key.is_some()
    }
}

//! Paystack payment gateway implementation.
//!
//! Wraps the two transaction endpoints the wallet funding flow needs
//! (`/transaction/initialize` and `/transaction/verify/{reference}`) and the
//! HMAC-SHA512 signature check for webhook deliveries.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha512;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{
    AppError, ConfigError, GatewayError, GatewayTransaction, InitializedTransaction,
    PaymentGateway, PaymentIntent,
};

/// Default Paystack API base URL
pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

type HmacSha512 = Hmac<Sha512>;

/// Paystack client configuration
#[derive(Debug)]
pub struct PaystackConfig {
    pub secret_key: SecretString,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Retries applied to verification only; initialization is never repeated
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub retry_base_delay: Duration,
}

impl PaystackConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::from(secret_key.into()),
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    /// Load from `PAYSTACK_*` environment variables; the secret key is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = std::env::var("PAYSTACK_SECRET_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("PAYSTACK_SECRET_KEY".to_string()))?;

        let base_url = std::env::var("PAYSTACK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_string());

        let timeout_secs = parse_env("PAYSTACK_TIMEOUT_SECS", 30)?;
        let max_retries = parse_env("PAYSTACK_MAX_RETRIES", 3)?;
        let retry_base_ms = parse_env("PAYSTACK_RETRY_BASE_MS", 500)?;

        Ok(Self {
            secret_key: SecretString::from(secret_key),
            base_url,
            timeout_secs,
            max_retries,
            retry_base_delay: Duration::from_millis(retry_base_ms),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("could not parse '{}'", raw),
        }),
        Err(_) => Ok(default),
    }
}

/// `{status, message, data}` wrapper Paystack puts around every response
#[derive(Debug, Deserialize)]
struct PaystackEnvelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Payment gateway backed by the Paystack REST API
pub struct PaystackGateway {
    http_client: Client,
    config: PaystackConfig,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        info!(base_url = %config.base_url, "Paystack gateway configured");
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::new(PaystackConfig::from_env()?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| GatewayError::Configuration(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Configuration("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.config.secret_key.expose_secret())
    }

    /// Send once and unwrap the envelope into `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 429 {
            return Err(GatewayError::RateLimited);
        }

        let envelope = serde_json::from_str::<PaystackEnvelope>(&body);

        if status.is_server_error() || status.as_u16() == 401 || status.as_u16() == 403 {
            let message = envelope
                .map(|e| e.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(GatewayError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let envelope = envelope.map_err(|e| {
            GatewayError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), e))
        })?;

        if !envelope.status {
            return Err(GatewayError::Declined(envelope.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("response has no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    /// Repeat an idempotent request with exponential backoff on retryable failures.
    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            match self.send(build()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Paystack request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let url = Url::parse(&self.config.base_url)
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;
        // Any HTTP answer means the API is reachable
        self.http_client
            .get(url)
            .send()
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }

    #[instrument(skip(self, intent), fields(reference = %intent.reference, amount = intent.amount))]
    async fn initialize_transaction(
        &self,
        intent: &PaymentIntent,
    ) -> Result<InitializedTransaction, AppError> {
        let url = self.endpoint(&["transaction", "initialize"])?;
        debug!(url = %url, "Initializing Paystack transaction");

        let request = self.authorized(self.http_client.post(url)).json(intent);
        let initialized: InitializedTransaction = self.send(request).await.map_err(|e| {
            if e.is_business_failure() {
                warn!(error = %e, "Paystack declined initialization");
            } else {
                error!(error = %e, "Paystack initialization failed");
            }
            e
        })?;

        info!(reference = %initialized.reference, "Paystack transaction initialized");
        Ok(initialized)
    }

    #[instrument(skip(self))]
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, AppError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        debug!(url = %url, "Verifying Paystack transaction");

        let transaction: GatewayTransaction = self
            .send_with_retry(|| self.authorized(self.http_client.get(url.clone())))
            .await
            .map_err(|e| {
                if e.is_business_failure() {
                    warn!(error = %e, "Paystack rejected verification");
                } else {
                    error!(error = %e, "Paystack verification failed");
                }
                e
            })?;

        info!(status = %transaction.status, amount = transaction.amount, "Paystack transaction verified");
        Ok(transaction)
    }

    fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(mut mac) =
            HmacSha512::new_from_slice(self.config.secret_key.expose_secret().as_bytes())
        else {
            return false;
        };
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());
        let provided = signature.trim().to_ascii_lowercase();

        if expected.len() != provided.len() {
            return false;
        }
        // Constant-time comparison
        expected
            .as_bytes()
            .iter()
            .zip(provided.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Compute the signature Paystack would send for `payload`
pub fn sign_webhook_payload(secret_key: &str, payload: &[u8]) -> String {
    let mut mac = match HmacSha512::new_from_slice(secret_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> PaystackGateway {
        PaystackGateway::new(PaystackConfig::new("sk_test_secret")).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = PaystackConfig::new("sk_test_abc");
        assert_eq!(config.base_url, DEFAULT_PAYSTACK_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        // Debug output must not leak the key
        assert!(!format!("{:?}", config).contains("sk_test_abc"));
    }

    #[test]
    fn test_endpoint_escapes_reference() {
        let gw = PaystackGateway::new(
            PaystackConfig::new("sk").with_base_url("http://localhost:9999/"),
        )
        .unwrap();
        let url = gw.endpoint(&["transaction", "verify", "ref/with space"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9999/transaction/verify/ref%2Fwith%20space"
        );
    }

    #[test]
    fn test_webhook_signature_roundtrip() {
        let gw = gateway();
        let body = br#"{"event":"charge.success","data":{"reference":"r1"}}"#;
        let signature = sign_webhook_payload("sk_test_secret", body);
        assert_eq!(signature.len(), 128);
        assert!(gw.validate_webhook_signature(body, &signature));
        assert!(gw.validate_webhook_signature(body, &signature.to_uppercase()));
    }

    #[test]
    fn test_webhook_signature_rejects_tampering() {
        let gw = gateway();
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign_webhook_payload("sk_test_secret", body);
        assert!(!gw.validate_webhook_signature(br#"{"event":"charge.failed"}"#, &signature));
        assert!(!gw.validate_webhook_signature(body, "invalid_signature"));
        assert!(!gw.validate_webhook_signature(body, &sign_webhook_payload("sk_other", body)));
    }
}

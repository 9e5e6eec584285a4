//! Backend calls made during wallet funding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::domain::{
    FundingReceipt, InitializePaymentData, InitializePaymentRequest, InitializePaymentResponse,
    VerificationResult, VerifyPaymentResponse,
};

use super::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The API operations the funding flow depends on
#[async_trait]
pub trait FundingBackend: Send + Sync {
    async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<InitializePaymentData, ClientError>;

    async fn verify_payment(&self, reference: &str) -> Result<VerificationResult, ClientError>;

    /// Credit the verified payment; `token` is sent as a bearer session
    async fn complete_funding(
        &self,
        reference: &str,
        token: Option<&str>,
    ) -> Result<FundingReceipt, ClientError>;
}

/// `FundingBackend` over HTTP
#[derive(Debug, Clone)]
pub struct HttpFundingBackend {
    client: Client,
    base_url: String,
}

impl HttpFundingBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            debug!(status = status.as_u16(), message = %message, "API rejected request");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Message from either the payment envelope or the generic error body
fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl FundingBackend for HttpFundingBackend {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<InitializePaymentData, ClientError> {
        let response: InitializePaymentResponse = self
            .send(
                self.client
                    .post(self.url("/api/paystack/initialize"))
                    .json(request),
            )
            .await?;
        Ok(response.data)
    }

    #[instrument(skip(self))]
    async fn verify_payment(&self, reference: &str) -> Result<VerificationResult, ClientError> {
        let response: VerifyPaymentResponse = self
            .send(
                self.client
                    .post(self.url("/api/paystack/verify"))
                    .json(&json!({ "reference": reference })),
            )
            .await?;
        Ok(response.data)
    }

    #[instrument(skip(self, token))]
    async fn complete_funding(
        &self,
        reference: &str,
        token: Option<&str>,
    ) -> Result<FundingReceipt, ClientError> {
        let mut request = self
            .client
            .post(self.url("/api/wallet/fund/complete"))
            .json(&json!({ "reference": reference }));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.send(request).await
    }
}

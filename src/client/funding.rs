//! Wallet funding orchestration.
//!
//! Drives one funding attempt end to end: initialize on the backend, collect
//! the payment in the gateway widget, verify, then ask the backend to credit
//! the wallet. The wallet is only ever credited server-side, after the
//! backend has re-verified the reference.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tracing::{info, instrument, warn};

use crate::domain::{FundingReceipt, InitializePaymentRequest, to_minor_units};

use super::ClientError;
use super::api::FundingBackend;
use super::cache::{QueryCache, WALLET_BALANCE_QUERY};
use super::config::ClientConfig;
use super::notify::NotificationHub;
use super::reference::{FundingEntry, generate_reference};
use super::session::SessionContext;
use super::widget::{PaymentWidget, WidgetOutcome, WidgetRequest};

/// How a funding attempt ended without error
#[derive(Debug, Clone)]
pub enum FundingOutcome {
    Credited(FundingReceipt),
    /// The widget was closed or failed; nothing was charged or credited
    Cancelled,
}

/// Clears the processing flag when the attempt ends, however it ends
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FundingOrchestrator {
    config: ClientConfig,
    backend: Arc<dyn FundingBackend>,
    widget: Arc<dyn PaymentWidget>,
    session: Arc<SessionContext>,
    queries: Arc<QueryCache>,
    hub: NotificationHub,
    processing: AtomicBool,
}

impl FundingOrchestrator {
    #[must_use]
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn FundingBackend>,
        widget: Arc<dyn PaymentWidget>,
        session: Arc<SessionContext>,
        queries: Arc<QueryCache>,
        hub: NotificationHub,
    ) -> Self {
        Self {
            config,
            backend,
            widget,
            session,
            queries,
            hub,
            processing: AtomicBool::new(false),
        }
    }

    /// Whether the pay button should be enabled
    #[must_use]
    pub fn can_pay(&self) -> bool {
        self.config.payments_enabled() && !self.is_processing()
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<ProcessingGuard<'_>, ClientError> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::AlreadyProcessing)?;
        Ok(ProcessingGuard(&self.processing))
    }

    /// Fund the wallet with `amount` naira
    #[instrument(skip(self))]
    pub async fn fund_wallet(
        &self,
        amount: f64,
        entry: FundingEntry,
    ) -> Result<FundingOutcome, ClientError> {
        let Some(public_key) = self.config.paystack_public_key.clone() else {
            return Err(ClientError::PaymentUnavailable);
        };
        if !amount.is_finite() || amount < self.config.min_funding_amount {
            return Err(ClientError::AmountTooLow {
                minimum: self.config.min_funding_amount,
            });
        }
        let _guard = self.begin()?;

        let result = self.run_funding(public_key, amount, entry).await;
        if let Err(e) = &result {
            self.hub.error(e.to_string());
        }
        result
    }

    /// Finish a funding attempt after the gateway redirected back with `reference`
    #[instrument(skip(self))]
    pub async fn resume_from_callback(&self, reference: &str) -> Result<FundingReceipt, ClientError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ClientError::InvalidReference);
        }
        let _guard = self.begin()?;

        let result = self.settle(reference).await;
        if let Err(e) = &result {
            self.hub.error(e.to_string());
        }
        result
    }

    async fn run_funding(
        &self,
        public_key: String,
        amount: f64,
        entry: FundingEntry,
    ) -> Result<FundingOutcome, ClientError> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let reference = generate_reference(entry);
        let request = InitializePaymentRequest {
            email: user.email.clone(),
            amount,
            reference: reference.clone(),
            metadata: Some(json!({ "user_id": user.id })),
        };
        let initialized = self.backend.initialize_payment(&request).await?;

        let outcome = self
            .widget
            .open(WidgetRequest {
                public_key,
                email: user.email,
                amount_minor: to_minor_units(amount),
                reference: initialized.reference.clone(),
                access_code: initialized.access_code,
            })
            .await;

        match outcome {
            WidgetOutcome::Completed { reference } => {
                let receipt = self.settle(&reference).await?;
                Ok(FundingOutcome::Credited(receipt))
            }
            WidgetOutcome::Closed => {
                self.on_close(&initialized.reference, None);
                Ok(FundingOutcome::Cancelled)
            }
            WidgetOutcome::Failed(reason) => {
                self.on_close(&initialized.reference, Some(&reason));
                Ok(FundingOutcome::Cancelled)
            }
        }
    }

    fn on_close(&self, reference: &str, reason: Option<&str>) {
        match reason {
            Some(reason) => warn!(reference, reason, "Payment widget failed"),
            None => info!(reference, "Payment widget closed"),
        }
        self.hub.info("Payment window closed");
    }

    async fn settle(&self, reference: &str) -> Result<FundingReceipt, ClientError> {
        let verification = self.backend.verify_payment(reference).await?;
        let token = self.session.token().await;
        let receipt = self
            .backend
            .complete_funding(&verification.reference, token.as_deref())
            .await?;

        self.queries.invalidate(WALLET_BALANCE_QUERY);
        let message = if receipt.already_credited {
            "Payment already applied to your wallet".to_string()
        } else {
            format!("Wallet funded with NGN {:.2}", receipt.amount)
        };
        self.hub.success(message);
        info!(
            reference = %receipt.reference,
            already_credited = receipt.already_credited,
            "Wallet funding completed"
        );
        Ok(receipt)
    }
}

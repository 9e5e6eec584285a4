//! Application service layer.
//!
//! Every wallet mutation goes through here: funding credits only after the
//! gateway confirms the payment, and group purchases only through the
//! repository's atomic join.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, CreateGroupRequest, CreateLivestockRequest, DatabaseClient, FundingReceipt,
    GatewayError, GatewayWebhookEvent, Group, GroupDetails, GroupStatus, HealthResponse,
    HealthStatus, InitializePaymentData, InitializePaymentRequest, JoinGroupReceipt, Livestock,
    PaginatedResponse, PaginationParams, PaymentGateway, PaymentIntent, User, ValidationError,
    VerificationResult, Wallet, WalletCredit, WalletError, WalletTransaction, metadata_user_id,
    to_major_units, to_minor_units,
};
use crate::infra::VerificationCache;

/// Path on the frontend the gateway redirects to after payment
pub const PAYMENT_CALLBACK_PATH: &str = "/dashboard/wallet/verify";

/// Webhook event that signals a captured charge
pub const CHARGE_SUCCESS_EVENT: &str = "charge.success";

/// Payment settings derived from configuration
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub callback_url: String,
}

impl PaymentSettings {
    #[must_use]
    pub fn new(frontend_base_url: &str) -> Self {
        Self {
            callback_url: format!(
                "{}{}",
                frontend_base_url.trim_end_matches('/'),
                PAYMENT_CALLBACK_PATH
            ),
        }
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

/// Application service containing business logic
pub struct AppService {
    db_client: Arc<dyn DatabaseClient>,
    payment_gateway: Arc<dyn PaymentGateway>,
    verification_cache: Arc<VerificationCache>,
    settings: PaymentSettings,
}

impl AppService {
    #[must_use]
    pub fn new(
        db_client: Arc<dyn DatabaseClient>,
        payment_gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
    ) -> Self {
        Self::with_cache(
            db_client,
            payment_gateway,
            settings,
            Arc::new(VerificationCache::default()),
        )
    }

    #[must_use]
    pub fn with_cache(
        db_client: Arc<dyn DatabaseClient>,
        payment_gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
        verification_cache: Arc<VerificationCache>,
    ) -> Self {
        Self {
            db_client,
            payment_gateway,
            verification_cache,
            settings,
        }
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.settings.callback_url
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Open a gateway transaction for a wallet top-up.
    ///
    /// The amount arrives in naira and is sent to the gateway in kobo.
    #[instrument(skip(self, request), fields(reference = %request.reference, amount = request.amount))]
    pub async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<InitializePaymentData, AppError> {
        request.validate().map_err(ValidationError::from)?;

        let amount_minor = to_minor_units(request.amount);
        if amount_minor <= 0 {
            return Err(ValidationError::InvalidField {
                field: "amount".to_string(),
                message: "Amount must be greater than 0".to_string(),
            }
            .into());
        }

        let intent = PaymentIntent {
            email: request.email.clone(),
            amount: amount_minor,
            reference: request.reference.clone(),
            metadata: request.metadata.clone(),
            callback_url: self.settings.callback_url.clone(),
        };

        let initialized = self.payment_gateway.initialize_transaction(&intent).await?;
        info!(access_code_len = initialized.access_code.len(), "Payment initialized");

        Ok(InitializePaymentData {
            access_code: initialized.access_code,
            reference: initialized.reference,
        })
    }

    /// Ask the gateway whether a reference was paid.
    ///
    /// Only `success` counts; any other status is a `NotSuccessful` failure
    /// carrying the gateway's record. Successful results are cached.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, reference: &str) -> Result<VerificationResult, AppError> {
        if reference.trim().is_empty() {
            return Err(ValidationError::MissingField("reference".to_string()).into());
        }

        if let Some(cached) = self.verification_cache.get(reference) {
            return Ok(cached);
        }

        let transaction = self.payment_gateway.verify_transaction(reference).await?;

        if !transaction.is_successful() {
            warn!(status = %transaction.status, "Payment not successful");
            let mut data = serde_json::to_value(&transaction).ok();
            if let Some(serde_json::Value::Object(fields)) = data.as_mut() {
                fields.remove("metadata");
            }
            return Err(GatewayError::NotSuccessful {
                reference: transaction.reference.clone(),
                status: transaction.status.clone(),
                message: "Payment verification failed".to_string(),
                data,
            }
            .into());
        }

        let result = VerificationResult::from(transaction);
        self.verification_cache.insert(result.clone());
        info!(amount = result.amount, "Payment verified");
        Ok(result)
    }

    /// Credit the caller's wallet for a reference the gateway confirms as paid.
    ///
    /// Safe to repeat: a second call returns the wallet with
    /// `already_credited` set instead of crediting again.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn complete_wallet_funding(
        &self,
        user: &User,
        reference: &str,
    ) -> Result<FundingReceipt, AppError> {
        let verification = self.verify_payment(reference).await?;

        // Without a user in the metadata the payer's email has to be the caller's
        let owned = match metadata_user_id(verification.metadata.as_ref()) {
            Some(owner) => owner == user.id,
            None => verification
                .customer
                .email
                .trim()
                .eq_ignore_ascii_case(user.email.trim()),
        };
        if !owned {
            warn!(reference = %verification.reference, "Funding reference belongs to another user");
            return Err(WalletError::ForeignReference(verification.reference).into());
        }

        self.credit_verified_payment(&user.id, &verification).await
    }

    /// Reconcile a signed gateway webhook.
    ///
    /// Returns the receipt when a `charge.success` event credited (or had
    /// already credited) a wallet, `None` when the event was ignored.
    #[instrument(skip(self, payload, signature), fields(payload_len = payload.len()))]
    pub async fn process_paystack_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<Option<FundingReceipt>, AppError> {
        let signature = signature
            .ok_or_else(|| AppError::Authentication("Missing webhook signature".to_string()))?;
        if !self
            .payment_gateway
            .validate_webhook_signature(payload, signature)
        {
            warn!("Rejected webhook with invalid signature");
            return Err(AppError::Authentication(
                "Invalid webhook signature".to_string(),
            ));
        }

        let event: GatewayWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::Deserialization(e.to_string()))?;

        if event.event != CHARGE_SUCCESS_EVENT {
            info!(event = %event.event, "Ignoring webhook event");
            return Ok(None);
        }

        let Some(user_id) = metadata_user_id(event.data.metadata.as_ref()) else {
            info!(reference = %event.data.reference, "charge.success without user, ignoring");
            return Ok(None);
        };

        // Never trust the webhook body for amounts
        let verification = self.verify_payment(&event.data.reference).await?;
        let receipt = self.credit_verified_payment(&user_id, &verification).await?;
        info!(
            reference = %receipt.reference,
            already_credited = receipt.already_credited,
            "Webhook reconciled"
        );
        Ok(Some(receipt))
    }

    async fn credit_verified_payment(
        &self,
        user_id: &str,
        verification: &VerificationResult,
    ) -> Result<FundingReceipt, AppError> {
        let credit = WalletCredit {
            user_id: user_id.to_string(),
            reference: verification.reference.clone(),
            amount_minor: verification.amount_minor(),
        };
        let outcome = self.db_client.credit_wallet(&credit).await?;

        Ok(FundingReceipt {
            reference: credit.reference,
            amount: to_major_units(outcome.transaction.amount_minor),
            wallet: outcome.wallet,
            already_credited: !outcome.newly_credited,
        })
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    /// The user's wallet, or an empty one if it was never credited
    #[instrument(skip(self))]
    pub async fn get_wallet(&self, user_id: &str) -> Result<Wallet, AppError> {
        Ok(self
            .db_client
            .get_wallet(user_id)
            .await?
            .unwrap_or_else(|| Wallet::empty(user_id)))
    }

    #[instrument(skip(self, params))]
    pub async fn list_wallet_transactions(
        &self,
        user_id: Option<&str>,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<WalletTransaction>, AppError> {
        params.validate().map_err(ValidationError::from)?;
        self.db_client
            .list_wallet_transactions(user_id, params.limit, params.cursor.as_deref())
            .await
    }

    // ------------------------------------------------------------------
    // Livestock and groups
    // ------------------------------------------------------------------

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_livestock(
        &self,
        request: &CreateLivestockRequest,
    ) -> Result<Livestock, AppError> {
        request.validate().map_err(ValidationError::from)?;
        let livestock = self.db_client.create_livestock(request).await?;
        info!(id = %livestock.id, "Livestock created");
        Ok(livestock)
    }

    pub async fn get_livestock(&self, id: &str) -> Result<Option<Livestock>, AppError> {
        self.db_client.get_livestock(id).await
    }

    pub async fn list_livestock(&self) -> Result<Vec<Livestock>, AppError> {
        self.db_client.list_livestock().await
    }

    #[instrument(skip(self, request, admin), fields(group_name = %request.group_name, admin_id = %admin.id))]
    pub async fn create_group(
        &self,
        request: &CreateGroupRequest,
        admin: &User,
    ) -> Result<Group, AppError> {
        request.validate().map_err(ValidationError::from)?;

        if self
            .db_client
            .get_livestock(&request.livestock_id)
            .await?
            .is_none()
        {
            return Err(ValidationError::InvalidField {
                field: "livestock_id".to_string(),
                message: "Livestock not found".to_string(),
            }
            .into());
        }

        let group = self.db_client.create_group(request, &admin.id).await?;
        info!(id = %group.id, "Group created");
        Ok(group)
    }

    #[instrument(skip(self))]
    pub async fn get_group_details(&self, id: &str) -> Result<Option<GroupDetails>, AppError> {
        let Some(group) = self.db_client.get_group(id).await? else {
            return Ok(None);
        };
        let livestock = self.db_client.get_livestock(&group.livestock_id).await?;
        let members = self.db_client.list_group_members(id).await?;
        Ok(Some(GroupDetails {
            group,
            livestock,
            members,
        }))
    }

    #[instrument(skip(self, params))]
    pub async fn list_groups(
        &self,
        status: Option<GroupStatus>,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<Group>, AppError> {
        params.validate().map_err(ValidationError::from)?;
        self.db_client
            .list_groups(status, params.limit, params.cursor.as_deref())
            .await
    }

    /// Buy `slots` in a group from the user's wallet balance
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn join_group(
        &self,
        group_id: &str,
        user: &User,
        slots: i32,
    ) -> Result<JoinGroupReceipt, AppError> {
        if slots < 1 {
            return Err(ValidationError::InvalidField {
                field: "slots".to_string(),
                message: "Slots must be at least 1".to_string(),
            }
            .into());
        }
        let receipt = self.db_client.join_group(group_id, &user.id, slots).await?;
        info!(
            slots,
            status = %receipt.group.status,
            balance_minor = receipt.wallet.balance_minor,
            "User joined group"
        );
        Ok(receipt)
    }

    #[instrument(skip(self))]
    pub async fn close_group(&self, group_id: &str) -> Result<Group, AppError> {
        let group = self.db_client.close_group(group_id).await?;
        info!(id = %group.id, "Group closed");
        Ok(group)
    }

    // ------------------------------------------------------------------
    // Users, sessions, health
    // ------------------------------------------------------------------

    /// Resolve a bearer token to a user
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        self.db_client
            .find_user_by_session(token)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))
    }

    #[instrument(skip(self, params))]
    pub async fn list_users(
        &self,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<User>, AppError> {
        params.validate().map_err(ValidationError::from)?;
        self.db_client
            .list_users(params.limit, params.cursor.as_deref())
            .await
    }

    /// Check health of all dependencies
    pub async fn health_check(&self) -> HealthResponse {
        let db_health = match self.db_client.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        };
        let gateway_health = match self.payment_gateway.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        };
        HealthResponse::new(db_health, gateway_health)
    }
}

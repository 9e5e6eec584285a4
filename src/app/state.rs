//! Application state management.

use std::sync::Arc;

use crate::domain::{DatabaseClient, PaymentGateway};
use crate::infra::VerificationCache;

use super::service::{AppService, PaymentSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
    pub db_client: Arc<dyn DatabaseClient>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub verification_cache: Arc<VerificationCache>,
}

impl AppState {
    /// Create a new application state with default payment settings
    #[must_use]
    pub fn new(
        db_client: Arc<dyn DatabaseClient>,
        payment_gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self::with_settings(db_client, payment_gateway, PaymentSettings::default())
    }

    /// Create a new application state with explicit payment settings
    #[must_use]
    pub fn with_settings(
        db_client: Arc<dyn DatabaseClient>,
        payment_gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
    ) -> Self {
        let verification_cache = Arc::new(VerificationCache::default());
        let service = Arc::new(AppService::with_cache(
            Arc::clone(&db_client),
            Arc::clone(&payment_gateway),
            settings,
            Arc::clone(&verification_cache),
        ));
        Self {
            service,
            db_client,
            payment_gateway,
            verification_cache,
        }
    }
}

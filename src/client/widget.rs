//! Gateway payment widget abstraction.

use async_trait::async_trait;

/// What the widget needs to collect a payment
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRequest {
    pub public_key: String,
    pub email: String,
    /// Amount in kobo
    pub amount_minor: i64,
    pub reference: String,
    pub access_code: String,
}

/// How the customer left the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// The gateway reported a completed payment for this reference
    Completed { reference: String },
    /// The customer dismissed the widget
    Closed,
    /// The widget failed to load or errored
    Failed(String),
}

/// The gateway's hosted checkout (inline popup or redirect page)
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    async fn open(&self, request: WidgetRequest) -> WidgetOutcome;
}

//! Client-side library driving wallet funding against the API.
//!
//! Models the browser half of the funding flow: reference generation, the
//! gateway widget, the backend calls, the cached balance query and user
//! notifications.

pub mod api;
pub mod cache;
pub mod config;
pub mod funding;
pub mod notify;
pub mod reference;
pub mod session;
pub mod widget;

use thiserror::Error;

pub use api::{FundingBackend, HttpFundingBackend};
pub use cache::{QueryCache, WALLET_BALANCE_QUERY};
pub use config::ClientConfig;
pub use funding::{FundingOrchestrator, FundingOutcome};
pub use notify::{Notification, NotificationHub, NotificationKind};
pub use reference::{FundingEntry, generate_reference};
pub use session::{NavEntry, SessionContext};
pub use widget::{PaymentWidget, WidgetOutcome, WidgetRequest};

/// Errors raised by the client library
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Payments are not configured")]
    PaymentUnavailable,

    #[error("Minimum funding amount is {minimum}")]
    AmountTooLow { minimum: f64 },

    #[error("A funding attempt is already in progress")]
    AlreadyProcessing,

    #[error("You must be logged in to fund your wallet")]
    NotAuthenticated,

    #[error("Invalid payment reference")]
    InvalidReference,

    /// The API answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

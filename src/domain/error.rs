//! Error taxonomy shared by every layer.

use thiserror::Error;

use super::validation::ValidationReport;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Group error: {0}")]
    Group(#[from] GroupError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound(err.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Duplicate(db_err.message().to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Failures talking to the payment gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered with `status: false` (declined card, unknown reference, ...)
    #[error("{0}")]
    Declined(String),

    /// The gateway verified the reference but the charge did not succeed
    #[error("payment {reference} is {status}: {message}")]
    NotSuccessful {
        reference: String,
        status: String,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("gateway returned HTTP {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("gateway rate limited the request")]
    RateLimited,

    #[error("gateway not configured: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Whether the failure is a business answer from the gateway rather than an outage.
    #[must_use]
    pub fn is_business_failure(&self) -> bool {
        matches!(self, Self::Declined(_) | Self::NotSuccessful { .. })
    }

    /// Whether repeating the same idempotent request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("{0}")]
    Schema(ValidationReport),
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient balance: {required_minor} kobo required, {available_minor} available")]
    InsufficientBalance {
        required_minor: i64,
        available_minor: i64,
    },

    #[error("reference {0} was already applied to another wallet")]
    ReferenceConflict(String),

    #[error("reference {0} belongs to another user")]
    ForeignReference(String),
}

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group {0} is not open for joining")]
    NotOpen(String),

    #[error("only {remaining} slot(s) left, {requested} requested")]
    SlotsUnavailable { requested: i32, remaining: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_classification() {
        assert!(GatewayError::Declined("declined".into()).is_business_failure());
        assert!(!GatewayError::Network("reset".into()).is_business_failure());

        assert!(GatewayError::Timeout("slow".into()).is_retryable());
        assert!(
            GatewayError::Api {
                status_code: 503,
                message: "down".into()
            }
            .is_retryable()
        );
        assert!(
            !GatewayError::Api {
                status_code: 401,
                message: "bad key".into()
            }
            .is_retryable()
        );
        assert!(!GatewayError::Declined("no".into()).is_retryable());
    }

    #[test]
    fn test_declined_displays_gateway_message_verbatim() {
        let err = GatewayError::Declined("Insufficient funds".to_string());
        assert_eq!(err.to_string(), "Insufficient funds");
    }

    #[test]
    fn test_app_error_wraps_nested_errors() {
        let err: AppError = WalletError::InsufficientBalance {
            required_minor: 500,
            available_minor: 100,
        }
        .into();
        assert!(err.to_string().contains("500 kobo required"));
    }
}

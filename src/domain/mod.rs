//! Domain layer containing core business types, traits, validation schemas and error definitions.

pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{
    AppError, ConfigError, DatabaseError, GatewayError, GroupError, ValidationError, WalletError,
};
pub use traits::{DatabaseClient, PaymentGateway};
pub use types::{
    CompleteFundingRequest, CreateGroupRequest, CreateLivestockRequest, CreditOutcome,
    ErrorDetail, ErrorResponse, FundingReceipt, GatewayTransaction, GatewayWebhookEvent, Group,
    GroupDetails, GroupMembership, GroupStatus, HealthResponse, HealthStatus, InitializePaymentData,
    InitializePaymentRequest, InitializePaymentResponse, InitializedTransaction,
    JoinGroupReceipt, JoinGroupRequest, Livestock, PaginatedResponse, PaginationParams,
    PaymentCustomer, PaymentFailureResponse, PaymentIntent, RateLimitResponse, User, UserRole,
    VerificationResult, VerifyPaymentRequest, VerifyPaymentResponse, Wallet, WalletCredit,
    WalletTransaction, WalletTransactionKind, metadata_user_id, to_major_units, to_minor_units,
};
pub use validation::{FieldViolation, ValidationOutcome, ValidationReport};

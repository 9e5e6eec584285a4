//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::ValidationError;
use super::validation::{
    FieldViolation, validate_not_blank, validate_otp, validate_password_strength,
    validate_phone_number,
};

/// Minor units (kobo) per major unit (naira)
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Largest catalogue price (naira) a group slot or livestock unit may carry
pub const MAX_PRICE_MAJOR: i64 = 1_000_000_000_000;

/// Currency every wallet is held in
pub const DEFAULT_CURRENCY: &str = "NGN";

/// Convert a major-unit amount to the gateway's minor unit.
#[must_use]
pub fn to_minor_units(major: f64) -> i64 {
    (major * MINOR_UNITS_PER_MAJOR as f64).round() as i64
}

/// Convert a whole-naira catalogue price to kobo, rejecting values that overflow.
pub fn price_to_minor_units(field: &str, major: i64) -> Result<i64, ValidationError> {
    major
        .checked_mul(MINOR_UNITS_PER_MAJOR)
        .filter(|minor| *minor > 0)
        .ok_or_else(|| ValidationError::InvalidField {
            field: field.to_string(),
            message: format!("{} is out of range", field),
        })
}

/// Convert a minor-unit amount back to the major unit.
#[must_use]
pub fn to_major_units(minor: i64) -> f64 {
    minor as f64 / MINOR_UNITS_PER_MAJOR as f64
}

/// Read the `user_id` a funding attempt was started for out of gateway metadata.
#[must_use]
pub fn metadata_user_id(metadata: Option<&serde_json::Value>) -> Option<String> {
    match metadata?.get("user_id")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Users and sessions
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registered platform user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct User {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "ada@farmeely.com")]
    pub email: String,
    #[schema(example = "+2348012345678")]
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// ============================================================================
// Wallets
// ============================================================================

/// A user's wallet; balance is held in minor units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    /// Balance in kobo
    #[schema(example = 5_000_000)]
    pub balance_minor: i64,
    #[schema(example = "NGN")]
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Empty wallet for a user that has never been credited
    #[must_use]
    pub fn empty(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            balance_minor: 0,
            currency: DEFAULT_CURRENCY.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance in naira
    #[must_use]
    pub fn balance(&self) -> f64 {
        to_major_units(self.balance_minor)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    /// Credit from a verified gateway payment
    Funding,
    /// Debit for slots bought in a group
    GroupPurchase,
}

impl WalletTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funding => "funding",
            Self::GroupPurchase => "group_purchase",
        }
    }
}

impl std::str::FromStr for WalletTransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funding" => Ok(Self::Funding),
            "group_purchase" => Ok(Self::GroupPurchase),
            _ => Err(format!("Invalid wallet transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for WalletTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger line on a wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct WalletTransaction {
    pub id: String,
    pub user_id: String,
    /// Unique per transaction; for funding this is the gateway reference
    #[schema(example = "wallet_funding_1718000000000_k3j9x2")]
    pub reference: String,
    pub kind: WalletTransactionKind,
    /// Signed amount in kobo (negative for debits)
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub created_at: DateTime<Utc>,
}

/// Instruction to credit a wallet once for a verified reference
#[derive(Debug, Clone, PartialEq)]
pub struct WalletCredit {
    pub user_id: String,
    pub reference: String,
    pub amount_minor: i64,
}

/// Result of applying a [`WalletCredit`]
#[derive(Debug, Clone)]
pub struct CreditOutcome {
    pub wallet: Wallet,
    pub transaction: WalletTransaction,
    /// False when the reference had already been applied
    pub newly_credited: bool,
}

// ============================================================================
// Livestock and groups
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Livestock {
    pub id: String,
    #[schema(example = "Ram")]
    pub name: String,
    #[schema(example = "Yankasa")]
    pub breed: Option<String>,
    /// Unit price in kobo
    pub price_minor: i64,
    pub weight_kg: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Accepting members
    #[default]
    Open,
    /// Every slot has been bought
    Filled,
    /// Closed by an administrator
    Closed,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Filled => "filled",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for GroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "filled" => Ok(Self::Filled),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Invalid group status: {}", s)),
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Investment group pooling funds for one livestock purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Group {
    pub id: String,
    #[schema(example = "Sallah Ram Pool")]
    pub group_name: String,
    pub livestock_id: String,
    #[schema(example = 10)]
    pub total_slots: i32,
    pub slots_taken: i32,
    /// Price of one slot in kobo
    pub slot_price_minor: i64,
    pub description: Option<String>,
    pub status: GroupStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    #[must_use]
    pub fn remaining_slots(&self) -> i32 {
        (self.total_slots - self.slots_taken).max(0)
    }
}

/// A user's stake in a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
    pub slots: i32,
    pub amount_paid_minor: i64,
    pub joined_at: DateTime<Utc>,
}

/// Group with its livestock listing and members
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupDetails {
    pub group: Group,
    pub livestock: Option<Livestock>,
    pub members: Vec<GroupMembership>,
}

/// Result of joining a group
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinGroupReceipt {
    pub group: Group,
    pub membership: GroupMembership,
    pub wallet: Wallet,
}

// ============================================================================
// Request payloads
// ============================================================================

/// Account creation payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email)]
    #[schema(example = "ada@farmeely.com")]
    pub email: String,
    #[validate(custom(function = "validate_phone_number"))]
    #[schema(example = "+2348012345678")]
    pub phone: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
}

/// Profile update payload; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone: Option<String>,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: Option<String>,
}

/// Group creation payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 3, max = 100, message = "Group name must be between 3 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Sallah Ram Pool")]
    pub group_name: String,
    #[validate(length(min = 1, message = "Livestock is required"))]
    pub livestock_id: String,
    #[validate(range(min = 1, max = 10000, message = "Total slots must be a positive integer"))]
    #[schema(example = 10)]
    pub total_slots: i32,
    /// Price of one slot in naira
    #[validate(range(
        min = 1,
        max = MAX_PRICE_MAJOR,
        message = "Slot price must be a positive integer no larger than 1000000000000"
    ))]
    #[schema(example = 25000)]
    pub slot_price: i64,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Livestock creation payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLivestockRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    #[schema(example = "Ram")]
    pub name: String,
    #[validate(length(max = 100))]
    pub breed: Option<String>,
    /// Unit price in naira
    #[validate(range(
        min = 1,
        max = MAX_PRICE_MAJOR,
        message = "Price must be a positive integer no larger than 1000000000000"
    ))]
    #[schema(example = 150000)]
    pub price: i64,
    #[validate(range(exclusive_min = 0.0, message = "Weight must be positive"))]
    pub weight_kg: Option<f64>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_otp"))]
    #[schema(example = "042917")]
    pub otp: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinGroupRequest {
    #[validate(range(min = 1, max = 1000, message = "Slots must be at least 1"))]
    #[schema(example = 2)]
    pub slots: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
}

/// Body of `POST /api/paystack/initialize`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InitializePaymentRequest {
    #[validate(email)]
    #[schema(example = "ada@farmeely.com")]
    pub email: String,
    /// Amount in naira
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than 0"))]
    #[schema(example = 5000)]
    pub amount: f64,
    #[validate(
        length(min = 1, max = 100, message = "Reference is required"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "wallet_funding_1718000000000_k3j9x2")]
    pub reference: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// Body of `POST /api/paystack/verify`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentRequest {
    #[validate(
        length(min = 1, max = 100, message = "Reference is required"),
        custom(function = "validate_not_blank")
    )]
    pub reference: String,
}

/// Body of `POST /api/wallet/fund/complete`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompleteFundingRequest {
    #[validate(
        length(min = 1, max = 100, message = "Reference is required"),
        custom(function = "validate_not_blank")
    )]
    pub reference: String,
}

// ============================================================================
// Gateway exchange
// ============================================================================

/// What is sent to the gateway to open a transaction; never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntent {
    pub email: String,
    /// Amount in kobo
    pub amount: i64,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub callback_url: String,
}

/// Gateway answer to a successful initialize call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: Option<String>,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentCustomer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub customer_code: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Transaction record returned by the gateway's verify endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub reference: String,
    /// Amount in kobo
    pub amount: i64,
    /// Gateway status string (`success`, `failed`, `abandoned`, ...)
    pub status: String,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer: PaymentCustomer,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

impl GatewayTransaction {
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

/// Verified payment as returned to callers (amount in naira)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VerificationResult {
    pub reference: String,
    /// Amount in naira
    #[schema(example = 500.0)]
    pub amount: f64,
    #[schema(example = "success")]
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub customer: PaymentCustomer,
    /// Metadata attached at initialization; kept server-side only
    #[serde(default, skip_serializing)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

impl VerificationResult {
    /// Amount in kobo
    #[must_use]
    pub fn amount_minor(&self) -> i64 {
        to_minor_units(self.amount)
    }
}

impl From<GatewayTransaction> for VerificationResult {
    fn from(tx: GatewayTransaction) -> Self {
        Self {
            reference: tx.reference,
            amount: to_major_units(tx.amount),
            status: tx.status,
            paid_at: tx.paid_at,
            customer: tx.customer,
            metadata: tx.metadata,
        }
    }
}

/// Webhook event posted by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhookEvent {
    pub event: String,
    pub data: GatewayWebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhookData {
    pub reference: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InitializePaymentData {
    pub access_code: String,
    pub reference: String,
}

/// `{status: "success", data: {access_code, reference}}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitializePaymentResponse {
    #[schema(example = "success")]
    pub status: String,
    pub data: InitializePaymentData,
}

impl InitializePaymentResponse {
    #[must_use]
    pub fn success(data: InitializePaymentData) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// `{status: "success", data: {reference, amount, status, paid_at, customer}}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    #[schema(example = "success")]
    pub status: String,
    pub data: VerificationResult,
}

impl VerifyPaymentResponse {
    #[must_use]
    pub fn success(data: VerificationResult) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Failure envelope used by the payment routes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentFailureResponse {
    /// `error` for initialize failures and upstream errors, `failed` for unsuccessful verification
    #[schema(example = "failed")]
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

impl PaymentFailureResponse {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            status: "failed".to_string(),
            message: message.into(),
            data: Some(data.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Result of completing a wallet funding
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundingReceipt {
    pub reference: String,
    /// Amount credited in naira
    pub amount: f64,
    pub wallet: Wallet,
    /// True when this reference had been credited by an earlier call
    pub already_credited: bool,
}

/// Pagination parameters for list requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 20)
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    #[schema(example = 20)]
    pub limit: i64,
    /// Cursor for pagination (ID to start after)
    #[schema(example = "uuid-string")]
    pub cursor: Option<String>,
}

fn default_limit() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            cursor: None,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub items: Vec<T>,
    /// Cursor for next page (null if no more items)
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub payment_gateway: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    /// The database is critical; an unreachable gateway only degrades the service.
    #[must_use]
    pub fn new(database: HealthStatus, payment_gateway: HealthStatus) -> Self {
        let status = match (&database, &payment_gateway) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };
        Self {
            status,
            database,
            payment_gateway,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    #[schema(example = "validation_error")]
    pub r#type: String,
    pub message: String,
    /// Per-field violations for validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    /// Seconds until rate limit resets
    #[schema(example = 1)]
    pub retry_after: u64,
}

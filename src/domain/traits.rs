//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{
    CreateGroupRequest, CreateLivestockRequest, CreditOutcome, GatewayTransaction, Group,
    GroupMembership, GroupStatus, InitializedTransaction, JoinGroupReceipt, Livestock,
    PaginatedResponse, PaymentIntent, User, Wallet, WalletCredit, WalletTransaction,
};

/// Payment gateway trait for collecting wallet funds
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Check gateway connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Open a transaction the customer will complete in the gateway widget
    async fn initialize_transaction(
        &self,
        intent: &PaymentIntent,
    ) -> Result<InitializedTransaction, AppError>;

    /// Fetch the gateway's authoritative record for a reference.
    ///
    /// Returns `GatewayError::Declined` when the gateway does not know the
    /// reference. A record with a non-success status is returned as-is.
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, AppError>;

    /// Check a webhook body against the signature header the gateway sent with it
    fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let _ = (payload, signature);
        false
    }
}

/// Database client trait for persistence operations
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Resolve a bearer session token to its user
    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, AppError>;

    /// List users with cursor-based pagination
    async fn list_users(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<User>, AppError>;

    /// Get a user's wallet, if one has been created
    async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>, AppError>;

    /// Credit a wallet exactly once per reference.
    ///
    /// Applying the same reference for the same user again returns the
    /// existing ledger line with `newly_credited == false`. A reference already
    /// applied for another user fails with `WalletError::ReferenceConflict`.
    async fn credit_wallet(&self, credit: &WalletCredit) -> Result<CreditOutcome, AppError>;

    /// List ledger lines, newest first; `None` lists every user's
    async fn list_wallet_transactions(
        &self,
        user_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<WalletTransaction>, AppError>;

    async fn create_livestock(
        &self,
        data: &CreateLivestockRequest,
    ) -> Result<Livestock, AppError>;

    async fn get_livestock(&self, id: &str) -> Result<Option<Livestock>, AppError>;

    async fn list_livestock(&self) -> Result<Vec<Livestock>, AppError>;

    /// Create a group for an existing livestock listing
    async fn create_group(
        &self,
        data: &CreateGroupRequest,
        created_by: &str,
    ) -> Result<Group, AppError>;

    async fn get_group(&self, id: &str) -> Result<Option<Group>, AppError>;

    /// List groups with cursor-based pagination, optionally by status
    async fn list_groups(
        &self,
        status: Option<GroupStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Group>, AppError>;

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMembership>, AppError>;

    /// Reserve slots and debit the wallet in one transaction
    async fn join_group(
        &self,
        group_id: &str,
        user_id: &str,
        slots: i32,
    ) -> Result<JoinGroupReceipt, AppError>;

    /// Stop a group from accepting members
    async fn close_group(&self, group_id: &str) -> Result<Group, AppError>;
}

//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::types::price_to_minor_units;
use crate::domain::{
    AppError, CreateGroupRequest, CreateLivestockRequest, CreditOutcome, DatabaseClient,
    DatabaseError, GatewayError, GatewayTransaction, Group, GroupError, GroupMembership,
    GroupStatus, InitializedTransaction, JoinGroupReceipt, Livestock, PaginatedResponse,
    PaymentCustomer, PaymentGateway, PaymentIntent, User, ValidationError, Wallet, WalletCredit,
    WalletError, WalletTransaction, WalletTransactionKind,
};
use crate::infra::gateway::sign_webhook_payload;

/// Secret the mock gateway signs webhooks with
pub const MOCK_GATEWAY_SECRET: &str = "sk_test_mock_secret";

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Mock error".to_string())
    }
}

#[derive(Default)]
struct MockStore {
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    wallets: HashMap<String, Wallet>,
    /// Insertion order; newest last
    transactions: Vec<WalletTransaction>,
    livestock: Vec<Livestock>,
    groups: Vec<Group>,
    members: Vec<GroupMembership>,
}

/// Newest-first page over `items` (stored oldest-first)
fn page<T: Clone + utoipa::ToSchema>(
    items: Vec<T>,
    limit: i64,
    cursor: Option<&str>,
    id_of: fn(&T) -> &str,
) -> Result<PaginatedResponse<T>, AppError> {
    let limit = limit.clamp(1, 100) as usize;
    let newest_first: Vec<T> = items.into_iter().rev().collect();
    let start = match cursor {
        Some(c) => {
            newest_first
                .iter()
                .position(|item| id_of(item) == c)
                .ok_or_else(|| {
                    AppError::Validation(ValidationError::InvalidField {
                        field: "cursor".to_string(),
                        message: "Invalid cursor".to_string(),
                    })
                })?
                + 1
        }
        None => 0,
    };
    let rest: Vec<T> = newest_first.into_iter().skip(start).collect();
    let has_more = rest.len() > limit;
    let page_items: Vec<T> = rest.into_iter().take(limit).collect();
    let next_cursor = if has_more {
        page_items.last().map(|item| id_of(item).to_string())
    } else {
        None
    };
    Ok(PaginatedResponse::new(page_items, next_cursor, has_more))
}

/// In-memory database client for testing
pub struct MockDatabaseClient {
    store: Arc<Mutex<MockStore>>,
    config: MockConfig,
    is_healthy: AtomicBool,
}

impl MockDatabaseClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(MockStore::default())),
            config,
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Register a user with a live session token
    pub fn seed_session(&self, token: &str, user: User) {
        let mut store = self.store.lock().unwrap();
        store.sessions.insert(token.to_string(), user.id.clone());
        store.users.insert(user.id.clone(), user);
    }

    pub fn seed_balance(&self, user_id: &str, balance_minor: i64) {
        let mut store = self.store.lock().unwrap();
        let wallet = store
            .wallets
            .entry(user_id.to_string())
            .or_insert_with(|| Wallet::empty(user_id));
        wallet.balance_minor = balance_minor;
    }

    pub fn seed_livestock(&self, name: &str, price_minor: i64) -> Livestock {
        let livestock = Livestock {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            breed: None,
            price_minor,
            weight_kg: None,
            description: None,
            image_url: None,
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().livestock.push(livestock.clone());
        livestock
    }

    /// Open group over a freshly seeded livestock listing
    pub fn seed_group(&self, total_slots: i32, slot_price_minor: i64) -> Group {
        let livestock = self.seed_livestock("Ram", slot_price_minor * i64::from(total_slots));
        let group = Group {
            id: Uuid::new_v4().to_string(),
            group_name: "Seeded Pool".to_string(),
            livestock_id: livestock.id,
            total_slots,
            slots_taken: 0,
            slot_price_minor,
            description: None,
            status: GroupStatus::Open,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().groups.push(group.clone());
        group
    }

    #[must_use]
    pub fn wallet_balance(&self, user_id: &str) -> i64 {
        self.store
            .lock()
            .unwrap()
            .wallets
            .get(user_id)
            .map_or(0, |w| w.balance_minor)
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.store.lock().unwrap().transactions.len()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Database(DatabaseError::Query(
                self.config.message(),
            )));
        }
        Ok(())
    }

    fn post_entry(
        store: &mut MockStore,
        user_id: &str,
        reference: String,
        kind: WalletTransactionKind,
        amount_minor: i64,
    ) -> (Wallet, WalletTransaction) {
        let wallet = store
            .wallets
            .entry(user_id.to_string())
            .or_insert_with(|| Wallet::empty(user_id));
        wallet.balance_minor += amount_minor;
        wallet.updated_at = Utc::now();
        let wallet = wallet.clone();

        let transaction = WalletTransaction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            reference,
            kind,
            amount_minor,
            balance_after_minor: wallet.balance_minor,
            created_at: Utc::now(),
        };
        store.transactions.push(transaction.clone());
        (wallet, transaction)
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, AppError> {
        self.check_should_fail()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .get(token)
            .and_then(|user_id| store.users.get(user_id))
            .cloned())
    }

    async fn list_users(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<User>, AppError> {
        self.check_should_fail()?;
        let mut users: Vec<User> = self.store.lock().unwrap().users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        page(users, limit, cursor, |u| u.id.as_str())
    }

    async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>, AppError> {
        self.check_should_fail()?;
        Ok(self.store.lock().unwrap().wallets.get(user_id).cloned())
    }

    async fn credit_wallet(&self, credit: &WalletCredit) -> Result<CreditOutcome, AppError> {
        self.check_should_fail()?;
        let mut store = self.store.lock().unwrap();

        if let Some(existing) = store
            .transactions
            .iter()
            .find(|t| t.reference == credit.reference)
            .cloned()
        {
            if existing.user_id != credit.user_id {
                return Err(WalletError::ReferenceConflict(credit.reference.clone()).into());
            }
            let wallet = store
                .wallets
                .get(&credit.user_id)
                .cloned()
                .unwrap_or_else(|| Wallet::empty(&credit.user_id));
            return Ok(CreditOutcome {
                wallet,
                transaction: existing,
                newly_credited: false,
            });
        }

        let (wallet, transaction) = Self::post_entry(
            &mut store,
            &credit.user_id,
            credit.reference.clone(),
            WalletTransactionKind::Funding,
            credit.amount_minor,
        );
        Ok(CreditOutcome {
            wallet,
            transaction,
            newly_credited: true,
        })
    }

    async fn list_wallet_transactions(
        &self,
        user_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<WalletTransaction>, AppError> {
        self.check_should_fail()?;
        let items: Vec<WalletTransaction> = self
            .store
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| user_id.is_none_or(|id| t.user_id == id))
            .cloned()
            .collect();
        page(items, limit, cursor, |t| t.id.as_str())
    }

    async fn create_livestock(
        &self,
        data: &CreateLivestockRequest,
    ) -> Result<Livestock, AppError> {
        self.check_should_fail()?;
        let livestock = Livestock {
            id: Uuid::new_v4().to_string(),
            name: data.name.trim().to_string(),
            breed: data.breed.clone(),
            price_minor: price_to_minor_units("price", data.price)?,
            weight_kg: data.weight_kg,
            description: data.description.clone(),
            image_url: data.image_url.clone(),
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().livestock.push(livestock.clone());
        Ok(livestock)
    }

    async fn get_livestock(&self, id: &str) -> Result<Option<Livestock>, AppError> {
        self.check_should_fail()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .livestock
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn list_livestock(&self) -> Result<Vec<Livestock>, AppError> {
        self.check_should_fail()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .livestock
            .iter()
            .rev()
            .cloned()
            .collect())
    }

    async fn create_group(
        &self,
        data: &CreateGroupRequest,
        created_by: &str,
    ) -> Result<Group, AppError> {
        self.check_should_fail()?;
        let group = Group {
            id: Uuid::new_v4().to_string(),
            group_name: data.group_name.trim().to_string(),
            livestock_id: data.livestock_id.clone(),
            total_slots: data.total_slots,
            slots_taken: 0,
            slot_price_minor: price_to_minor_units("slot_price", data.slot_price)?,
            description: data.description.clone(),
            status: GroupStatus::Open,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, AppError> {
        self.check_should_fail()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn list_groups(
        &self,
        status: Option<crate::domain::GroupStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Group>, AppError> {
        self.check_should_fail()?;
        let items: Vec<Group> = self
            .store
            .lock()
            .unwrap()
            .groups
            .iter()
            .filter(|g| status.is_none_or(|s| g.status == s))
            .cloned()
            .collect();
        page(items, limit, cursor, |g| g.id.as_str())
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMembership>, AppError> {
        self.check_should_fail()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn join_group(
        &self,
        group_id: &str,
        user_id: &str,
        slots: i32,
    ) -> Result<JoinGroupReceipt, AppError> {
        self.check_should_fail()?;
        let mut store = self.store.lock().unwrap();

        let group = store
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;

        if group.status != GroupStatus::Open {
            return Err(GroupError::NotOpen(group.id).into());
        }
        if group.remaining_slots() < slots {
            return Err(GroupError::SlotsUnavailable {
                requested: slots,
                remaining: group.remaining_slots(),
            }
            .into());
        }

        let cost = group.slot_price_minor * i64::from(slots);
        let available = store.wallets.get(user_id).map_or(0, |w| w.balance_minor);
        if available < cost {
            return Err(WalletError::InsufficientBalance {
                required_minor: cost,
                available_minor: available,
            }
            .into());
        }

        let (wallet, _) = Self::post_entry(
            &mut store,
            user_id,
            format!("group_purchase_{}_{}", group.id, Uuid::new_v4().simple()),
            WalletTransactionKind::GroupPurchase,
            -cost,
        );

        let group = {
            let stored = store
                .groups
                .iter_mut()
                .find(|g| g.id == group_id)
                .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;
            stored.slots_taken += slots;
            if stored.slots_taken >= stored.total_slots {
                stored.status = GroupStatus::Filled;
            }
            stored.clone()
        };

        let position = store
            .members
            .iter()
            .position(|m| m.group_id == group_id && m.user_id == user_id);
        let membership = match position {
            Some(index) => {
                let existing = &mut store.members[index];
                existing.slots += slots;
                existing.amount_paid_minor += cost;
                existing.clone()
            }
            None => {
                let membership = GroupMembership {
                    group_id: group_id.to_string(),
                    user_id: user_id.to_string(),
                    slots,
                    amount_paid_minor: cost,
                    joined_at: Utc::now(),
                };
                store.members.push(membership.clone());
                membership
            }
        };

        Ok(JoinGroupReceipt {
            group,
            membership,
            wallet,
        })
    }

    async fn close_group(&self, group_id: &str) -> Result<Group, AppError> {
        self.check_should_fail()?;
        let mut store = self.store.lock().unwrap();
        let group = store
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;
        group.status = GroupStatus::Closed;
        Ok(group.clone())
    }
}

/// Mock payment gateway for testing
pub struct MockPaymentGateway {
    transactions: Mutex<HashMap<String, GatewayTransaction>>,
    intents: Mutex<Vec<PaymentIntent>>,
    decline_message: Mutex<Option<String>>,
    verify_calls: AtomicUsize,
    config: MockConfig,
}

impl MockPaymentGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            intents: Mutex::new(Vec::new()),
            decline_message: Mutex::new(None),
            verify_calls: AtomicUsize::new(0),
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Make the next initialize calls answer `status: false` with `message`
    pub fn decline_initialize(&self, message: impl Into<String>) {
        *self.decline_message.lock().unwrap() = Some(message.into());
    }

    /// Register what verifying `reference` returns
    pub fn set_transaction(
        &self,
        reference: &str,
        amount_minor: i64,
        status: &str,
        metadata: Option<serde_json::Value>,
    ) {
        let transaction = GatewayTransaction {
            reference: reference.to_string(),
            amount: amount_minor,
            status: status.to_string(),
            paid_at: (status == "success").then(Utc::now),
            customer: PaymentCustomer {
                email: "ada@farmeely.com".to_string(),
                ..Default::default()
            },
            metadata,
            currency: Some("NGN".to_string()),
            gateway_response: Some(if status == "success" {
                "Approved".to_string()
            } else {
                "Declined".to_string()
            }),
        };
        self.transactions
            .lock()
            .unwrap()
            .insert(reference.to_string(), transaction);
    }

    /// Change the payer email on a registered transaction
    pub fn set_customer_email(&self, reference: &str, email: &str) {
        if let Some(tx) = self.transactions.lock().unwrap().get_mut(reference) {
            tx.customer.email = email.to_string();
        }
    }

    #[must_use]
    pub fn initialized_intents(&self) -> Vec<PaymentIntent> {
        self.intents.lock().unwrap().clone()
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Signature the gateway would attach to `payload`
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> String {
        sign_webhook_payload(MOCK_GATEWAY_SECRET, payload)
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Gateway(GatewayError::Network(
                self.config.message(),
            )));
        }
        Ok(())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check_should_fail()
    }

    async fn initialize_transaction(
        &self,
        intent: &PaymentIntent,
    ) -> Result<InitializedTransaction, AppError> {
        self.check_should_fail()?;
        if let Some(message) = self.decline_message.lock().unwrap().clone() {
            return Err(GatewayError::Declined(message).into());
        }
        self.intents.lock().unwrap().push(intent.clone());
        Ok(InitializedTransaction {
            authorization_url: Some(format!("https://checkout.paystack.com/{}", intent.reference)),
            access_code: format!("ac_{}", Uuid::new_v4().simple()),
            reference: intent.reference.clone(),
        })
    }

    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, AppError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.check_should_fail()?;
        self.transactions
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::Declined("Transaction reference not found".to_string()).into())
    }

    fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.sign(payload) == signature
    }
}

//! PostgreSQL database client implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::domain::types::price_to_minor_units;
use crate::domain::{
    AppError, CreateGroupRequest, CreateLivestockRequest, CreditOutcome, DatabaseClient,
    DatabaseError, Group, GroupError, GroupMembership, GroupStatus, JoinGroupReceipt, Livestock,
    PaginatedResponse, User, UserRole, ValidationError, Wallet, WalletCredit, WalletError,
    WalletTransaction, WalletTransactionKind,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, role, created_at";
const WALLET_COLUMNS: &str = "id, user_id, balance_minor, currency, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, reference, kind, amount_minor, balance_after_minor, created_at";
const LIVESTOCK_COLUMNS: &str =
    "id, name, breed, price_minor, weight_kg, description, image_url, created_at";
const GROUP_COLUMNS: &str = "id, group_name, livestock_id, total_slots, slots_taken, \
     slot_price_minor, description, status, created_by, created_at";
const MEMBER_COLUMNS: &str = "group_id, user_id, slots, amount_paid_minor, joined_at";

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(DatabaseError::from(e))
}

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_user(row: &PgRow) -> User {
        let role: String = row.get("role");
        User {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            role: role.parse().unwrap_or_default(),
            created_at: row.get("created_at"),
        }
    }

    fn row_to_wallet(row: &PgRow) -> Wallet {
        Wallet {
            id: row.get("id"),
            user_id: row.get("user_id"),
            balance_minor: row.get("balance_minor"),
            currency: row.get("currency"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_transaction(row: &PgRow) -> Result<WalletTransaction, AppError> {
        let kind: String = row.get("kind");
        Ok(WalletTransaction {
            id: row.get("id"),
            user_id: row.get("user_id"),
            reference: row.get("reference"),
            kind: kind
                .parse()
                .map_err(|e: String| AppError::Database(DatabaseError::Query(e)))?,
            amount_minor: row.get("amount_minor"),
            balance_after_minor: row.get("balance_after_minor"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_livestock(row: &PgRow) -> Livestock {
        Livestock {
            id: row.get("id"),
            name: row.get("name"),
            breed: row.get("breed"),
            price_minor: row.get("price_minor"),
            weight_kg: row.get("weight_kg"),
            description: row.get("description"),
            image_url: row.get("image_url"),
            created_at: row.get("created_at"),
        }
    }

    fn row_to_group(row: &PgRow) -> Result<Group, AppError> {
        let status: String = row.get("status");
        Ok(Group {
            id: row.get("id"),
            group_name: row.get("group_name"),
            livestock_id: row.get("livestock_id"),
            total_slots: row.get("total_slots"),
            slots_taken: row.get("slots_taken"),
            slot_price_minor: row.get("slot_price_minor"),
            description: row.get("description"),
            status: status
                .parse()
                .map_err(|e: String| AppError::Database(DatabaseError::Query(e)))?,
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_membership(row: &PgRow) -> GroupMembership {
        GroupMembership {
            group_id: row.get("group_id"),
            user_id: row.get("user_id"),
            slots: row.get("slots"),
            amount_paid_minor: row.get("amount_paid_minor"),
            joined_at: row.get("joined_at"),
        }
    }

    /// `created_at` of the row a cursor points at
    async fn cursor_created_at(&self, table: &str, cursor: &str) -> Result<DateTime<Utc>, AppError> {
        let row = sqlx::query(&format!("SELECT created_at FROM {} WHERE id = $1", table))
            .bind(cursor)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(row.get("created_at")),
            None => Err(AppError::Validation(ValidationError::InvalidField {
                field: "cursor".to_string(),
                message: "Invalid cursor".to_string(),
            })),
        }
    }

    /// Split `limit + 1` fetched rows into a page and its continuation cursor
    fn paginate<T, F>(
        rows: &[PgRow],
        limit: i64,
        map: F,
        id_of: fn(&T) -> String,
    ) -> Result<PaginatedResponse<T>, AppError>
    where
        T: ToSchema,
        F: Fn(&PgRow) -> Result<T, AppError>,
    {
        let has_more = rows.len() > limit as usize;
        let items = rows
            .iter()
            .take(limit as usize)
            .map(map)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if has_more {
            items.last().map(id_of)
        } else {
            None
        };

        Ok(PaginatedResponse::new(items, next_cursor, has_more))
    }

    /// Create the wallet row if needed and lock it for the rest of the transaction
    async fn lock_wallet(
        tx: &mut Transaction<'static, Postgres>,
        user_id: &str,
    ) -> Result<Wallet, AppError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, user_id, balance_minor, currency, created_at, updated_at)
            VALUES ($1, $2, 0, 'NGN', NOW(), NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1 FOR UPDATE",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?;

        Ok(Self::row_to_wallet(&row))
    }

    /// Apply a signed amount to a locked wallet and record the ledger line
    async fn post_ledger_entry(
        tx: &mut Transaction<'static, Postgres>,
        user_id: &str,
        reference: &str,
        kind: WalletTransactionKind,
        amount_minor: i64,
    ) -> Result<(Wallet, WalletTransaction), AppError> {
        let wallet_row = sqlx::query(&format!(
            r#"
            UPDATE wallets
            SET balance_minor = balance_minor + $1, updated_at = NOW()
            WHERE user_id = $2
            RETURNING {}
            "#,
            WALLET_COLUMNS
        ))
        .bind(amount_minor)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?;
        let wallet = Self::row_to_wallet(&wallet_row);

        let tx_row = sqlx::query(&format!(
            r#"
            INSERT INTO wallet_transactions
                (id, user_id, reference, kind, amount_minor, balance_after_minor, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(reference)
        .bind(kind.as_str())
        .bind(amount_minor)
        .bind(wallet.balance_minor)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Duplicate(_) => {
                AppError::Wallet(WalletError::ReferenceConflict(reference.to_string()))
            }
            other => AppError::Database(other),
        })?;

        Ok((wallet, Self::row_to_transaction(&tx_row)?))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn find_user_by_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.email, u.phone, u.role, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    #[instrument(skip(self))]
    async fn list_users(
        &self,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<User>, AppError> {
        let limit = limit.clamp(1, 100);
        let fetch_limit = limit + 1;

        let rows = match cursor {
            Some(cursor_id) => {
                let cursor_created_at = self.cursor_created_at("users", cursor_id).await?;
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM users
                    WHERE (created_at, id) < ($1, $2)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $3
                    "#,
                    USER_COLUMNS
                ))
                .bind(cursor_created_at)
                .bind(cursor_id)
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?
            }
            None => sqlx::query(&format!(
                "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT $1",
                USER_COLUMNS
            ))
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };

        Self::paginate(&rows, limit, |r| Ok(Self::row_to_user(r)), |u: &User| u.id.clone())
    }

    #[instrument(skip(self))]
    async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(Self::row_to_wallet))
    }

    #[instrument(skip(self, credit), fields(user_id = %credit.user_id, reference = %credit.reference, amount_minor = credit.amount_minor))]
    async fn credit_wallet(&self, credit: &WalletCredit) -> Result<CreditOutcome, AppError> {
        if credit.amount_minor <= 0 {
            return Err(AppError::Validation(ValidationError::InvalidField {
                field: "amount".to_string(),
                message: "Credit amount must be positive".to_string(),
            }));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Holding the wallet lock serializes credits for the same user
        let wallet = Self::lock_wallet(&mut tx, &credit.user_id).await?;

        let existing = sqlx::query(&format!(
            "SELECT {} FROM wallet_transactions WHERE reference = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(&credit.reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        if let Some(row) = existing {
            let transaction = Self::row_to_transaction(&row)?;
            tx.rollback().await.map_err(db_err)?;

            if transaction.user_id != credit.user_id {
                warn!(owner = %transaction.user_id, "Reference already credited to another wallet");
                return Err(WalletError::ReferenceConflict(credit.reference.clone()).into());
            }
            info!("Reference already credited, skipping");
            return Ok(CreditOutcome {
                wallet,
                transaction,
                newly_credited: false,
            });
        }

        let (wallet, transaction) = Self::post_ledger_entry(
            &mut tx,
            &credit.user_id,
            &credit.reference,
            WalletTransactionKind::Funding,
            credit.amount_minor,
        )
        .await?;

        tx.commit().await.map_err(db_err)?;
        info!(balance_minor = wallet.balance_minor, "Wallet credited");

        Ok(CreditOutcome {
            wallet,
            transaction,
            newly_credited: true,
        })
    }

    #[instrument(skip(self))]
    async fn list_wallet_transactions(
        &self,
        user_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<WalletTransaction>, AppError> {
        let limit = limit.clamp(1, 100);
        let fetch_limit = limit + 1;

        let rows = match cursor {
            Some(cursor_id) => {
                let cursor_created_at = self
                    .cursor_created_at("wallet_transactions", cursor_id)
                    .await?;
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM wallet_transactions
                    WHERE ($1::TEXT IS NULL OR user_id = $1)
                      AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                    TRANSACTION_COLUMNS
                ))
                .bind(user_id)
                .bind(cursor_created_at)
                .bind(cursor_id)
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?
            }
            None => sqlx::query(&format!(
                r#"
                SELECT {} FROM wallet_transactions
                WHERE ($1::TEXT IS NULL OR user_id = $1)
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#,
                TRANSACTION_COLUMNS
            ))
            .bind(user_id)
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };

        Self::paginate(&rows, limit, Self::row_to_transaction, |t: &WalletTransaction| {
            t.id.clone()
        })
    }

    #[instrument(skip(self, data), fields(name = %data.name, price = data.price))]
    async fn create_livestock(
        &self,
        data: &CreateLivestockRequest,
    ) -> Result<Livestock, AppError> {
        let price_minor = price_to_minor_units("price", data.price)?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO livestock
                (id, name, breed, price_minor, weight_kg, description, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING {}
            "#,
            LIVESTOCK_COLUMNS
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(data.name.trim())
        .bind(&data.breed)
        .bind(price_minor)
        .bind(data.weight_kg)
        .bind(&data.description)
        .bind(&data.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Self::row_to_livestock(&row))
    }

    #[instrument(skip(self))]
    async fn get_livestock(&self, id: &str) -> Result<Option<Livestock>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM livestock WHERE id = $1",
            LIVESTOCK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(Self::row_to_livestock))
    }

    #[instrument(skip(self))]
    async fn list_livestock(&self) -> Result<Vec<Livestock>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM livestock ORDER BY created_at DESC, id DESC",
            LIVESTOCK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(Self::row_to_livestock).collect())
    }

    #[instrument(skip(self, data), fields(group_name = %data.group_name, total_slots = data.total_slots))]
    async fn create_group(
        &self,
        data: &CreateGroupRequest,
        created_by: &str,
    ) -> Result<Group, AppError> {
        let slot_price_minor = price_to_minor_units("slot_price", data.slot_price)?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO investment_groups
                (id, group_name, livestock_id, total_slots, slots_taken, slot_price_minor,
                 description, status, created_by, created_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7, $8, NOW())
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(data.group_name.trim())
        .bind(&data.livestock_id)
        .bind(data.total_slots)
        .bind(slot_price_minor)
        .bind(&data.description)
        .bind(GroupStatus::Open.as_str())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Self::row_to_group(&row)
    }

    #[instrument(skip(self))]
    async fn get_group(&self, id: &str) -> Result<Option<Group>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM investment_groups WHERE id = $1",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(Self::row_to_group).transpose()
    }

    #[instrument(skip(self))]
    async fn list_groups(
        &self,
        status: Option<GroupStatus>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Group>, AppError> {
        let limit = limit.clamp(1, 100);
        let fetch_limit = limit + 1;
        let status = status.map(|s| s.as_str());

        let rows = match cursor {
            Some(cursor_id) => {
                let cursor_created_at = self
                    .cursor_created_at("investment_groups", cursor_id)
                    .await?;
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM investment_groups
                    WHERE ($1::TEXT IS NULL OR status = $1)
                      AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                    GROUP_COLUMNS
                ))
                .bind(status)
                .bind(cursor_created_at)
                .bind(cursor_id)
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?
            }
            None => sqlx::query(&format!(
                r#"
                SELECT {} FROM investment_groups
                WHERE ($1::TEXT IS NULL OR status = $1)
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#,
                GROUP_COLUMNS
            ))
            .bind(status)
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };

        Self::paginate(&rows, limit, Self::row_to_group, |g: &Group| g.id.clone())
    }

    #[instrument(skip(self))]
    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMembership>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM group_members WHERE group_id = $1 ORDER BY joined_at ASC",
            MEMBER_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(Self::row_to_membership).collect())
    }

    #[instrument(skip(self))]
    async fn join_group(
        &self,
        group_id: &str,
        user_id: &str,
        slots: i32,
    ) -> Result<JoinGroupReceipt, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Lock order: group, then wallet
        let group_row = sqlx::query(&format!(
            "SELECT {} FROM investment_groups WHERE id = $1 FOR UPDATE",
            GROUP_COLUMNS
        ))
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;
        let group = Self::row_to_group(&group_row)?;

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

        let cost = group
            .slot_price_minor
            .checked_mul(i64::from(slots))
            .ok_or_else(|| AppError::Internal("slot cost overflow".to_string()))?;

        let wallet = Self::lock_wallet(&mut tx, user_id).await?;
        if wallet.balance_minor < cost {
            return Err(WalletError::InsufficientBalance {
                required_minor: cost,
                available_minor: wallet.balance_minor,
            }
            .into());
        }

        let reference = format!("group_purchase_{}_{}", group.id, uuid::Uuid::new_v4().simple());
        let (wallet, _) = Self::post_ledger_entry(
            &mut tx,
            user_id,
            &reference,
            WalletTransactionKind::GroupPurchase,
            -cost,
        )
        .await?;

        let group_row = sqlx::query(&format!(
            r#"
            UPDATE investment_groups
            SET slots_taken = slots_taken + $1,
                status = CASE WHEN slots_taken + $1 >= total_slots THEN 'filled' ELSE status END
            WHERE id = $2
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(slots)
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        let group = Self::row_to_group(&group_row)?;

        let member_row = sqlx::query(&format!(
            r#"
            INSERT INTO group_members (group_id, user_id, slots, amount_paid_minor, joined_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (group_id, user_id) DO UPDATE SET
                slots = group_members.slots + EXCLUDED.slots,
                amount_paid_minor = group_members.amount_paid_minor + EXCLUDED.amount_paid_minor
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(group_id)
        .bind(user_id)
        .bind(slots)
        .bind(cost)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        info!(
            slots_taken = group.slots_taken,
            status = %group.status,
            balance_minor = wallet.balance_minor,
            "Group joined"
        );

        Ok(JoinGroupReceipt {
            group,
            membership: Self::row_to_membership(&member_row),
            wallet,
        })
    }

    #[instrument(skip(self))]
    async fn close_group(&self, group_id: &str) -> Result<Group, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE investment_groups SET status = $1 WHERE id = $2 RETURNING {}",
            GROUP_COLUMNS
        ))
        .bind(GroupStatus::Closed.as_str())
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?;

        Self::row_to_group(&row)
    }
}

impl std::fmt::Debug for PostgresClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresClient")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

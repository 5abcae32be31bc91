//! SurrealDB implementation of [`AccountRepository`].
//!
//! Accounts arrive with the password already hashed; this module never
//! sees a plaintext password.

use chrono::{DateTime, Utc};
use mindwell_core::error::MindwellResult;
use mindwell_core::models::account::{Account, AccountStatus, CreateAccount, ResetConfirmation};
use mindwell_core::repository::AccountRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AccountRow {
    email: String,
    password_hash: String,
    status: String,
    confirmation_code_hash: Option<String>,
    confirmation_expires_at: Option<DateTime<Utc>>,
    confirmation_attempts: u32,
    confirmation_attempts_total: u32,
    confirmation_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccountRowWithId {
    record_id: String,
    email: String,
    password_hash: String,
    status: String,
    confirmation_code_hash: Option<String>,
    confirmation_expires_at: Option<DateTime<Utc>>,
    confirmation_attempts: u32,
    confirmation_attempts_total: u32,
    confirmation_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<AccountStatus, DbError> {
    match s {
        "PendingConfirmation" => Ok(AccountStatus::PendingConfirmation),
        "Active" => Ok(AccountStatus::Active),
        other => Err(DbError::Decode(format!("unknown account status: {other}"))),
    }
}

fn status_to_string(s: &AccountStatus) -> &'static str {
    match s {
        AccountStatus::PendingConfirmation => "PendingConfirmation",
        AccountStatus::Active => "Active",
    }
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Result<Account, DbError> {
        Ok(Account {
            id,
            email: self.email,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            confirmation_code_hash: self.confirmation_code_hash,
            confirmation_expires_at: self.confirmation_expires_at,
            confirmation_attempts: self.confirmation_attempts,
            confirmation_attempts_total: self.confirmation_attempts_total,
            confirmation_sent_at: self.confirmation_sent_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Account {
            id,
            email: self.email,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            confirmation_code_hash: self.confirmation_code_hash,
            confirmation_expires_at: self.confirmation_expires_at,
            confirmation_attempts: self.confirmation_attempts,
            confirmation_attempts_total: self.confirmation_attempts_total,
            confirmation_sent_at: self.confirmation_sent_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Account repository.
#[derive(Clone)]
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// First row of a conditional `UPDATE`; `None` when the `WHERE` clause
/// matched nothing.
fn first_updated(rows: Vec<AccountRow>, id: Uuid) -> Result<Option<Account>, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_account(id))
        .transpose()
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> MindwellResult<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 email = $email, \
                 password_hash = $password_hash, \
                 status = $status, \
                 confirmation_code_hash = $confirmation_code_hash, \
                 confirmation_expires_at = $confirmation_expires_at, \
                 confirmation_sent_at = $confirmation_sent_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind((
                "status",
                status_to_string(&AccountStatus::PendingConfirmation).to_string(),
            ))
            .bind(("confirmation_code_hash", input.confirmation_code_hash))
            .bind(("confirmation_expires_at", input.confirmation_expires_at))
            .bind(("confirmation_sent_at", input.confirmation_sent_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            let message = e.to_string();
            // Unique index violation on `idx_account_email`.
            if message.contains("already contains") {
                DbError::AlreadyExists {
                    entity: "account".into(),
                }
            } else {
                DbError::Query(message)
            }
        })?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_email(&self, email: &str) -> MindwellResult<Account> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM account WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn reserve_confirmation_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
        max_total_attempts: u32,
    ) -> MindwellResult<Option<Account>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 confirmation_attempts += 1, \
                 confirmation_attempts_total += 1, \
                 updated_at = time::now() \
                 WHERE status = 'PendingConfirmation' \
                 AND confirmation_code_hash != NONE \
                 AND confirmation_expires_at > time::now() \
                 AND confirmation_attempts < $max_attempts \
                 AND confirmation_attempts_total < $max_total_attempts",
            )
            .bind(("id", id.to_string()))
            .bind(("max_attempts", max_attempts))
            .bind(("max_total_attempts", max_total_attempts))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_updated(rows, id)?)
    }

    async fn activate(&self, id: Uuid, code_hash: &str) -> MindwellResult<Option<Account>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 status = 'Active', \
                 confirmation_code_hash = NONE, \
                 confirmation_expires_at = NONE, \
                 confirmation_sent_at = NONE, \
                 confirmation_attempts = 0, \
                 updated_at = time::now() \
                 WHERE status = 'PendingConfirmation' \
                 AND confirmation_code_hash = $code_hash",
            )
            .bind(("id", id.to_string()))
            .bind(("code_hash", code_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_updated(rows, id)?)
    }

    async fn discard_confirmation(&self, id: Uuid, code_hash: &str) -> MindwellResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 confirmation_code_hash = NONE, \
                 confirmation_expires_at = NONE, \
                 updated_at = time::now() \
                 WHERE confirmation_code_hash = $code_hash",
            )
            .bind(("id", id.to_string()))
            .bind(("code_hash", code_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn reset_confirmation(
        &self,
        id: Uuid,
        reset: ResetConfirmation,
    ) -> MindwellResult<Option<Account>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 confirmation_code_hash = $code_hash, \
                 confirmation_expires_at = $expires_at, \
                 confirmation_sent_at = $sent_at, \
                 confirmation_attempts = 0, \
                 updated_at = time::now() \
                 WHERE status = 'PendingConfirmation' \
                 AND confirmation_sent_at <= $not_before \
                 AND confirmation_attempts_total < $max_total_attempts",
            )
            .bind(("id", id.to_string()))
            .bind(("code_hash", reset.code_hash))
            .bind(("expires_at", reset.expires_at))
            .bind(("sent_at", reset.sent_at))
            .bind(("not_before", reset.not_before))
            .bind(("max_total_attempts", reset.max_total_attempts))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_updated(rows, id)?)
    }
}

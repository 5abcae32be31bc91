//! Account domain model backing the bundled identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountStatus {
    /// Registered, waiting for the emailed confirmation code.
    PendingConfirmation,
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub status: AccountStatus,
    /// SHA-256 hex digest of the outstanding confirmation code.
    pub confirmation_code_hash: Option<String>,
    pub confirmation_expires_at: Option<DateTime<Utc>>,
    /// Codes checked against the outstanding confirmation code.
    pub confirmation_attempts: u32,
    /// Codes checked over the account's lifetime, across resends.
    pub confirmation_attempts_total: u32,
    /// When the outstanding code was issued.
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub email: String,
    /// Argon2id PHC string; hashing happens in the identity service.
    pub password_hash: String,
    pub confirmation_code_hash: String,
    pub confirmation_expires_at: DateTime<Utc>,
    pub confirmation_sent_at: DateTime<Utc>,
}

/// A fresh confirmation code for a pending account.
#[derive(Debug, Clone)]
pub struct ResetConfirmation {
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub sent_at: DateTime<Utc>,
    /// The previous code must have been sent at or before this instant.
    pub not_before: DateTime<Utc>,
    pub max_total_attempts: u32,
}

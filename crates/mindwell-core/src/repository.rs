//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in
//! `mindwell-db`; handlers and services only see these traits.

use uuid::Uuid;

use crate::error::MindwellResult;
use crate::models::account::{Account, CreateAccount, ResetConfirmation};
use crate::models::submission::Submission;

// ---------------------------------------------------------------------------
// Submissions (keyed by user email)
// ---------------------------------------------------------------------------

pub trait SubmissionRepository: Send + Sync {
    /// Create or fully replace the record stored under `user_email`.
    ///
    /// Fields absent from `submission` are absent afterwards; nothing is
    /// merged from the previous record.
    fn upsert(
        &self,
        user_email: &str,
        submission: Submission,
    ) -> impl Future<Output = MindwellResult<Submission>> + Send;
    fn get_by_key(
        &self,
        user_email: &str,
    ) -> impl Future<Output = MindwellResult<Option<Submission>>> + Send;
    /// Unordered, unbounded scan of every stored submission.
    fn scan_all(&self) -> impl Future<Output = MindwellResult<Vec<Submission>>> + Send;
    /// Remove the record under `user_email`. Succeeds when none exists.
    fn delete_by_key(&self, user_email: &str) -> impl Future<Output = MindwellResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    fn create(&self, input: CreateAccount) -> impl Future<Output = MindwellResult<Account>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = MindwellResult<Account>> + Send;
    /// Atomically count one confirmation attempt against the outstanding
    /// code and return the account as updated.
    ///
    /// Returns `None` without counting when the account is not pending,
    /// has no unexpired code, or either limit is already reached. Only a
    /// reserved attempt may be compared with the code.
    fn reserve_confirmation_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
        max_total_attempts: u32,
    ) -> impl Future<Output = MindwellResult<Option<Account>>> + Send;
    /// Mark the account active and clear its code, but only while
    /// `code_hash` is still the outstanding code. Returns `None` otherwise.
    fn activate(
        &self,
        id: Uuid,
        code_hash: &str,
    ) -> impl Future<Output = MindwellResult<Option<Account>>> + Send;
    /// Clear the outstanding code if it is still `code_hash`.
    fn discard_confirmation(
        &self,
        id: Uuid,
        code_hash: &str,
    ) -> impl Future<Output = MindwellResult<()>> + Send;
    /// Replace the outstanding code and reset the per-code attempt counter.
    ///
    /// Returns `None` without changes when the previous code was sent after
    /// `not_before`, the account is not pending, or the lifetime attempt
    /// budget is spent. The lifetime counter is never reset.
    fn reset_confirmation(
        &self,
        id: Uuid,
        reset: ResetConfirmation,
    ) -> impl Future<Output = MindwellResult<Option<Account>>> + Send;
}

//! Identity service: registration, confirmation and sign-in.
//!
//! Every operation returns an [`IdentityResult`]. Rejections carry a
//! short message meant for the user; storage or hashing faults are
//! logged and reported with a generic message, so no raw error ever
//! reaches the caller.

use chrono::{DateTime, Duration, Utc};
use mindwell_core::error::MindwellError;
use mindwell_core::models::account::{Account, AccountStatus, CreateAccount, ResetConfirmation};
use mindwell_core::repository::AccountRepository;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::confirmation::{self, ConfirmationNotifier};
use crate::password;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
const BAD_CREDENTIALS: &str = "Incorrect username or password.";
const UNKNOWN_USER: &str = "Username/client id combination not found.";

/// A rejected identity operation with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IdentityFailure {
    pub message: String,
}

impl IdentityFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn internal(operation: &str, err: impl std::fmt::Display) -> Self {
        error!(operation, error = %err, "Identity operation failed");
        Self::new(GENERIC_FAILURE)
    }
}

pub type IdentityResult<T> = Result<T, IdentityFailure>;

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct SignUpOutput {
    pub user_id: Uuid,
    pub email: String,
}

/// Result of a successful sign-in or confirmation.
#[derive(Debug, Clone)]
pub struct SignInOutput {
    pub user_id: Uuid,
    pub email: String,
}

/// Identity service.
///
/// Generic over the account repository and the code notifier so the
/// auth layer has no dependency on the database crate.
pub struct IdentityService<A: AccountRepository, N: ConfirmationNotifier> {
    accounts: A,
    notifier: N,
    config: AuthConfig,
}

impl<A: AccountRepository, N: ConfirmationNotifier> IdentityService<A, N> {
    pub fn new(accounts: A, notifier: N, config: AuthConfig) -> Self {
        Self {
            accounts,
            notifier,
            config,
        }
    }

    /// Register a new account and send it a confirmation code.
    pub async fn register(&self, email: &str, password: &str) -> IdentityResult<SignUpOutput> {
        let email = normalize_email(email)?;

        if password.chars().count() < self.config.min_password_length {
            return Err(IdentityFailure::new(format!(
                "Password did not conform with policy: Password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        match self.accounts.get_by_email(&email).await {
            Ok(_) => return Err(already_exists()),
            Err(MindwellError::NotFound { .. }) => {}
            Err(e) => return Err(IdentityFailure::internal("register", e)),
        }

        let password_hash = password::hash_password(password, self.config.pepper.as_deref())
            .map_err(|e| IdentityFailure::internal("register", e))?;
        let code = confirmation::generate_code();
        let sent_at = Utc::now();
        let expires_at = self.code_expiry(sent_at, "register")?;

        let account = self
            .accounts
            .create(CreateAccount {
                email: email.clone(),
                password_hash,
                confirmation_code_hash: confirmation::hash_code(&code),
                confirmation_expires_at: expires_at,
                confirmation_sent_at: sent_at,
            })
            .await
            .map_err(|e| match e {
                MindwellError::AlreadyExists { .. } => already_exists(),
                other => IdentityFailure::internal("register", other),
            })?;

        self.notifier.send_confirmation_code(&account.email, &code);
        info!(user_id = %account.id, "Account registered, awaiting confirmation");

        Ok(SignUpOutput {
            user_id: account.id,
            email: account.email,
        })
    }

    /// Verify email and password of a confirmed account.
    pub async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<SignInOutput> {
        let email = normalize_email(email)?;

        let account = match self.accounts.get_by_email(&email).await {
            Ok(account) => account,
            Err(MindwellError::NotFound { .. }) => {
                warn!("Sign-in for unknown account");
                return Err(IdentityFailure::new(BAD_CREDENTIALS));
            }
            Err(e) => return Err(IdentityFailure::internal("authenticate", e)),
        };

        let valid = password::verify_password(
            password,
            &account.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(|e| IdentityFailure::internal("authenticate", e))?;

        if !valid {
            warn!(user_id = %account.id, "Sign-in with wrong password");
            return Err(IdentityFailure::new(BAD_CREDENTIALS));
        }

        if account.status != AccountStatus::Active {
            return Err(IdentityFailure::new("User is not confirmed."));
        }

        info!(user_id = %account.id, "User signed in");

        Ok(SignInOutput {
            user_id: account.id,
            email: account.email,
        })
    }

    /// Activate an account with the code that was sent at registration.
    pub async fn confirm_registration(&self, email: &str, code: &str) -> IdentityResult<SignInOutput> {
        let email = normalize_email(email)?;

        let account = match self.accounts.get_by_email(&email).await {
            Ok(account) => account,
            Err(MindwellError::NotFound { .. }) => {
                return Err(IdentityFailure::new(UNKNOWN_USER));
            }
            Err(e) => return Err(IdentityFailure::internal("confirm_registration", e)),
        };

        if account.status == AccountStatus::Active {
            return Err(IdentityFailure::new(
                "User cannot be confirmed. Current status is CONFIRMED",
            ));
        }

        let max_attempts = self.config.max_confirmation_attempts;
        let max_total = self.config.max_total_confirmation_attempts;

        if account.confirmation_attempts_total >= max_total {
            return Err(locked());
        }

        // The counter is bumped before the code is compared, so concurrent
        // guesses cannot exceed the limits.
        let reserved = self
            .accounts
            .reserve_confirmation_attempt(account.id, max_attempts, max_total)
            .await
            .map_err(|e| IdentityFailure::internal("confirm_registration", e))?;
        let Some(reserved) = reserved else {
            return Err(self.no_attempt_left(&account));
        };
        let Some(stored_hash) = reserved.confirmation_code_hash.as_deref() else {
            return Err(expired_code());
        };

        if confirmation::hash_code(code) != stored_hash {
            let attempts = reserved.confirmation_attempts;
            let total = reserved.confirmation_attempts_total;

            if attempts >= max_attempts || total >= max_total {
                self.accounts
                    .discard_confirmation(reserved.id, stored_hash)
                    .await
                    .map_err(|e| IdentityFailure::internal("confirm_registration", e))?;
                warn!(user_id = %reserved.id, attempts, total, "Confirmation code discarded after too many attempts");
                return Err(if total >= max_total {
                    locked()
                } else {
                    attempts_exceeded()
                });
            }

            warn!(user_id = %reserved.id, attempts, "Wrong confirmation code");
            return Err(IdentityFailure::new(
                "Invalid verification code provided, please try again.",
            ));
        }

        let account = self
            .accounts
            .activate(reserved.id, stored_hash)
            .await
            .map_err(|e| IdentityFailure::internal("confirm_registration", e))?
            .ok_or_else(expired_code)?;

        info!(user_id = %account.id, "Account confirmed");

        Ok(SignInOutput {
            user_id: account.id,
            email: account.email,
        })
    }

    /// Issue a fresh code for a pending account, replacing the old one.
    ///
    /// Only the per-code attempt count starts over; the lifetime count
    /// carries across resends. Codes are sent at most once per
    /// `resend_cooldown_secs`.
    pub async fn resend_confirmation_code(&self, email: &str) -> IdentityResult<()> {
        let email = normalize_email(email)?;

        let account = match self.accounts.get_by_email(&email).await {
            Ok(account) => account,
            Err(MindwellError::NotFound { .. }) => {
                return Err(IdentityFailure::new(UNKNOWN_USER));
            }
            Err(e) => return Err(IdentityFailure::internal("resend_confirmation_code", e)),
        };

        if account.status == AccountStatus::Active {
            return Err(IdentityFailure::new("User is already confirmed."));
        }

        if account.confirmation_attempts_total >= self.config.max_total_confirmation_attempts {
            return Err(locked());
        }

        let code = confirmation::generate_code();
        let sent_at = Utc::now();
        let not_before = i64::try_from(self.config.resend_cooldown_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|cooldown| sent_at.checked_sub_signed(cooldown))
            .ok_or_else(|| {
                IdentityFailure::internal("resend_confirmation_code", "resend cooldown out of range")
            })?;

        let reset = ResetConfirmation {
            code_hash: confirmation::hash_code(&code),
            expires_at: self.code_expiry(sent_at, "resend_confirmation_code")?,
            sent_at,
            not_before,
            max_total_attempts: self.config.max_total_confirmation_attempts,
        };

        let updated = self
            .accounts
            .reset_confirmation(account.id, reset)
            .await
            .map_err(|e| IdentityFailure::internal("resend_confirmation_code", e))?;
        if updated.is_none() {
            warn!(user_id = %account.id, "Confirmation code requested again too soon");
            return Err(IdentityFailure::new(
                "Attempt limit exceeded, please try after some time.",
            ));
        }

        self.notifier.send_confirmation_code(&account.email, &code);
        info!(user_id = %account.id, "Confirmation code resent");

        Ok(())
    }

    /// Reason a confirmation attempt could not be reserved.
    fn no_attempt_left(&self, account: &Account) -> IdentityFailure {
        let code_usable = account.confirmation_code_hash.is_some()
            && account
                .confirmation_expires_at
                .is_some_and(|expires_at| expires_at > Utc::now());

        if account.confirmation_attempts_total >= self.config.max_total_confirmation_attempts {
            locked()
        } else if code_usable {
            attempts_exceeded()
        } else {
            expired_code()
        }
    }

    fn code_expiry(&self, sent_at: DateTime<Utc>, operation: &str) -> IdentityResult<DateTime<Utc>> {
        i64::try_from(self.config.confirmation_code_lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| sent_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                IdentityFailure::internal(operation, "confirmation code lifetime out of range")
            })
    }
}

fn normalize_email(email: &str) -> IdentityResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(IdentityFailure::new("Invalid email address format.")),
    }
}

fn already_exists() -> IdentityFailure {
    IdentityFailure::new("An account with the given email already exists.")
}

fn expired_code() -> IdentityFailure {
    IdentityFailure::new("Invalid code provided, please request a code again.")
}

fn attempts_exceeded() -> IdentityFailure {
    IdentityFailure::new("Attempt limit exceeded, please request a code again.")
}

fn locked() -> IdentityFailure {
    IdentityFailure::new("Too many failed attempts. This account can no longer be confirmed.")
}

//! Authentication configuration.

/// Configuration for sessions and the identity service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign session cookies.
    pub session_secret: String,
    /// Session lifetime in seconds (default: 604_800 = 7 days).
    pub session_lifetime_secs: u64,
    /// Session token issuer (`iss` claim).
    pub session_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Registration confirmation code lifetime in seconds
    /// (default: 86_400 = 24 hours).
    pub confirmation_code_lifetime_secs: u64,
    /// Wrong codes accepted before the outstanding code is discarded
    /// (default: 5).
    pub max_confirmation_attempts: u32,
    /// Codes checked over an account's lifetime before it can no longer
    /// be confirmed or sent a new code (default: 20).
    pub max_total_confirmation_attempts: u32,
    /// Minimum seconds between two codes sent to one account
    /// (default: 60).
    pub resend_cooldown_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            session_lifetime_secs: 604_800,
            session_issuer: "mindwell".into(),
            pepper: None,
            min_password_length: 8,
            confirmation_code_lifetime_secs: 86_400,
            max_confirmation_attempts: 5,
            max_total_confirmation_attempts: 20,
            resend_cooldown_secs: 60,
        }
    }
}

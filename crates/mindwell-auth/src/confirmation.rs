//! Registration confirmation codes and their delivery.

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;

/// Generate a random 6-digit confirmation code.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// SHA-256 hash of a confirmation code, hex-encoded.
///
/// This is the value stored as `account.confirmation_code_hash`.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Delivers confirmation codes to newly registered users.
pub trait ConfirmationNotifier: Send + Sync {
    fn send_confirmation_code(&self, email: &str, code: &str);
}

impl<T: ConfirmationNotifier + ?Sized> ConfirmationNotifier for std::sync::Arc<T> {
    fn send_confirmation_code(&self, email: &str, code: &str) {
        (**self).send_confirmation_code(email, code);
    }
}

/// Notifier that writes the code to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl ConfirmationNotifier for TracingNotifier {
    fn send_confirmation_code(&self, email: &str, code: &str) {
        info!(email = %email, code = %code, "Confirmation code issued");
    }
}

//! Account passwords: Argon2id hashing and verification.
//!
//! Hashes use m=19456 (19 MiB), t=2, p=1 with a fresh salt per call. A
//! configured pepper is prepended to the password on both paths, so a
//! hash only verifies under the pepper it was made with.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::error::AuthError;

const MEMORY_KIB: u32 = 19_456;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

fn peppered(password: &str, pepper: Option<&str>) -> Vec<u8> {
    match pepper {
        Some(p) => format!("{p}{password}").into_bytes(),
        None => password.as_bytes().to_vec(),
    }
}

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash `password` into a PHC string for storage.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(&peppered(password, pepper), &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// `Ok(false)` is a mismatch; `Err(AuthError::Crypto)` means the stored
/// hash could not be parsed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match hasher()?.verify_password(&peppered(password, pepper), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_uses_argon2id_with_account_parameters() {
        let hash = hash_password("correct-horse-battery", None).unwrap();

        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"), "got {hash}");
        assert!(verify_password("correct-horse-battery", &hash, None).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("correct-horse-battery", None).unwrap();
        let b = hash_password("correct-horse-battery", None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("correct-horse-battery", None).unwrap();
        assert!(!verify_password("wrong-horse", &hash, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let hash = hash_password("correct-horse-battery", Some("pepper!")).unwrap();

        assert!(verify_password("correct-horse-battery", &hash, Some("pepper!")).unwrap());
        assert!(!verify_password("correct-horse-battery", &hash, None).unwrap());
        assert!(!verify_password("correct-horse-battery", &hash, Some("other")).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(matches!(
            verify_password("pw", "not-a-hash", None),
            Err(AuthError::Crypto(_))
        ));
    }
}

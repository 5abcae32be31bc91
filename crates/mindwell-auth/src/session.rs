//! Signed session tokens.
//!
//! A session is an HS256 JWT carrying the account id and email. It is
//! handed to the browser in a cookie by the server crate; nothing is
//! stored server-side, so logging out only clears the cookie.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Upper bound on a session lifetime: 400 days, the longest cookie
/// `Max-Age` browsers honour.
pub const MAX_SESSION_LIFETIME_SECS: i64 = 400 * 24 * 60 * 60;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: account id.
    pub sub: String,
    pub email: String,
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

/// The authenticated identity behind a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    #[serde(rename = "id")]
    pub user_id: String,
    pub email: String,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Issues and validates session tokens.
///
/// Built once at startup from [`AuthConfig`] and shared by every request.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime_secs: i64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("issuer", &self.issuer)
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.session_secret.is_empty() {
            return Err(AuthError::Crypto("session secret must not be empty".into()));
        }
        let lifetime_secs = i64::try_from(config.session_lifetime_secs)
            .ok()
            .filter(|secs| (1..=MAX_SESSION_LIFETIME_SECS).contains(secs))
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "session lifetime must be between 1 and {MAX_SESSION_LIFETIME_SECS} seconds, got {}",
                    config.session_lifetime_secs
                ))
            })?;

        let secret = config.session_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.session_issuer.clone(),
            lifetime_secs,
        })
    }

    /// Session lifetime in seconds, used as the cookie `Max-Age`.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Sign a new session token for `user_id` / `email`.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.lifetime_secs,
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify signature, issuer and expiry of a session token.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    /// Current user for an optional session token.
    ///
    /// Missing, tampered and expired tokens all yield `None`.
    pub fn current_user(&self, token: Option<&str>) -> Option<SessionUser> {
        let token = token?;
        match self.decode(token) {
            Ok(claims) => Some(claims.into()),
            Err(e) => {
                debug!(error = %e, "Ignoring unusable session token");
                None
            }
        }
    }

    /// Like [`current_user`](Self::current_user) but rejects with
    /// [`AuthError::Unauthenticated`] when there is no valid session.
    pub fn require_user(&self, token: Option<&str>) -> Result<SessionUser, AuthError> {
        self.current_user(token).ok_or(AuthError::Unauthenticated)
    }
}

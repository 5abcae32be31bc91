//! MindWell Auth — password hashing, signed session tokens and the
//! identity service used for registration, confirmation and sign-in.

pub mod config;
pub mod confirmation;
pub mod error;
pub mod identity;
pub mod password;
pub mod session;

pub use config::AuthConfig;
pub use confirmation::{ConfirmationNotifier, TracingNotifier};
pub use error::AuthError;
pub use identity::{IdentityFailure, IdentityResult, IdentityService, SignInOutput, SignUpOutput};
pub use session::{MAX_SESSION_LIFETIME_SECS, SessionClaims, SessionManager, SessionUser};

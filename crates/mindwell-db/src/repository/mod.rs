//! SurrealDB repository implementations.

mod account;
mod submission;

pub use account::SurrealAccountRepository;
pub use submission::SurrealSubmissionRepository;

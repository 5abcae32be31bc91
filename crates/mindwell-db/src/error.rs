//! Database-specific error types and conversions.

use mindwell_core::error::MindwellError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Stored record could not be decoded: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for MindwellError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MindwellError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => MindwellError::AlreadyExists { entity },
            other => MindwellError::Database(other.to_string()),
        }
    }
}

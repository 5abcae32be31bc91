//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables use SCHEMAFULL mode. Enums are stored as strings with ASSERT
//! constraints; submissions use the user email as the record id so an
//! upsert on the same email always lands on the same record.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Intake submissions, one per user email (record id = email)
-- =======================================================================
DEFINE TABLE submission SCHEMAFULL;
DEFINE FIELD user_email ON TABLE submission TYPE string;
DEFINE FIELD user_id ON TABLE submission TYPE string;
DEFINE FIELD client_name ON TABLE submission TYPE option<string>;
DEFINE FIELD first_name ON TABLE submission TYPE option<string>;
DEFINE FIELD last_name ON TABLE submission TYPE option<string>;
DEFINE FIELD email ON TABLE submission TYPE option<string>;
DEFINE FIELD phone ON TABLE submission TYPE option<string>;
DEFINE FIELD location ON TABLE submission TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['ithaca', 'remote'];
DEFINE FIELD dob ON TABLE submission TYPE option<string>;
DEFINE FIELD service_type ON TABLE submission TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['therapy', 'assessment'];
DEFINE FIELD concerns ON TABLE submission TYPE array<string> DEFAULT [];
DEFINE FIELD comments ON TABLE submission TYPE option<string>;
DEFINE FIELD submitted_at ON TABLE submission TYPE datetime;

-- =======================================================================
-- Accounts of the bundled identity provider
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD email ON TABLE account TYPE string;
DEFINE FIELD password_hash ON TABLE account TYPE string;
DEFINE FIELD status ON TABLE account TYPE string \
    ASSERT $value IN ['PendingConfirmation', 'Active'];
DEFINE FIELD confirmation_code_hash ON TABLE account TYPE option<string>;
DEFINE FIELD confirmation_expires_at ON TABLE account TYPE option<datetime>;
DEFINE FIELD confirmation_sent_at ON TABLE account TYPE option<datetime>;
DEFINE FIELD confirmation_attempts ON TABLE account TYPE int DEFAULT 0;
DEFINE FIELD confirmation_attempts_total ON TABLE account TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_email ON TABLE account \
    COLUMNS email UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

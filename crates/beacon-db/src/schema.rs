//! Event store schema.
//!
//! The store holds exactly one durable table, so there is no migration
//! framework: [`ensure_schema`] applies the embedded DDL once and stamps the
//! version into SQLite's `user_version` header field. A future schema
//! revision bumps [`SCHEMA_VERSION`] and grows this module into stepwise
//! upgrades; until then the simple stamp is all the bookkeeping needed.

use rusqlite::Connection;
use thiserror::Error;

/// Version stamped into the database header once the schema is in place.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors from schema setup.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading the stored schema version failed.
    #[error("failed to read event store schema version: {0}")]
    Version(#[source] rusqlite::Error),

    /// Applying the schema DDL failed.
    #[error("failed to apply event store schema: {0}")]
    Apply(#[source] rusqlite::Error),

    /// The store was written by a newer release and must not be touched.
    #[error("event store schema version {found} is newer than supported version {supported}")]
    FutureVersion {
        /// Version found in the database header.
        found: i32,
        /// Highest version this build understands.
        supported: i32,
    },
}

/// Brings the connected database up to the current schema.
///
/// Returns `true` when the DDL was applied and `false` when the store was
/// already current. The DDL and the version stamp commit in one transaction,
/// so a failure leaves the store untouched.
///
/// # Errors
///
/// Returns `SchemaError::FutureVersion` when the store carries a version
/// newer than this build, and the underlying SQLite error when the header
/// cannot be read or the DDL fails.
pub fn ensure_schema(conn: &Connection) -> Result<bool, SchemaError> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(SchemaError::Version)?;

    if found == SCHEMA_VERSION {
        return Ok(false);
    }
    if found > SCHEMA_VERSION {
        return Err(SchemaError::FutureVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.unchecked_transaction().map_err(SchemaError::Apply)?;
    tx.execute_batch(SCHEMA_SQL).map_err(SchemaError::Apply)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(SchemaError::Apply)?;
    tx.commit().map_err(SchemaError::Apply)?;

    tracing::info!(version = SCHEMA_VERSION, "event store schema applied");
    Ok(true)
}

//! Schema & Statement Cache.
//!
//! Owns the database handle, creates the schema on first open, and applies
//! `synchronous = OFF` (the indexer is idempotent across re-runs, so fsync
//! per commit buys nothing). Every other module borrows the [`Database`]'s
//! connection rather than opening its own.
//!
//! Turso's async `Statement` borrows the connection mutably for the
//! lifetime of a single query, so there is no benefit to holding long-lived
//! prepared-statement handles the way a synchronous driver would; what this
//! layer caches instead is the SQL text itself, as `const` strings next to
//! the component that owns each query. `prepare` is still called once per
//! use, exactly as it would be against a cached `Statement`.

pub mod migration;

use crate::error::SchemaError;
use std::path::Path;
use turso::{Builder, Connection, Value};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub async fn open(path: &Path) -> Result<Self, SchemaError> {
        let path_str = path.to_string_lossy().to_string();
        let database = Builder::new_local(&path_str)
            .build()
            .await
            .map_err(|source| SchemaError::Open {
                path: path_str.clone(),
                source,
            })?;
        let conn = database.connect().map_err(|source| SchemaError::Open {
            path: path_str.clone(),
            source,
        })?;

        // Idempotent re-runs make full durability unnecessary; relaxed sync
        // trades a crash-window for throughput on what is, by design, a
        // re-derivable cache of the repository's own object database.
        conn.execute("PRAGMA synchronous = OFF", ())
            .await
            .map_err(|source| SchemaError::Open {
                path: path_str.clone(),
                source,
            })?;

        migration::run_migrations(&conn)
            .await
            .map_err(|source| SchemaError::Migration {
                version: 1,
                name: "complete_schema".to_string(),
                source,
            })?;

        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Wrap an already-open, already-migrated connection. Used by unit
    /// tests that need an in-memory database without touching the
    /// filesystem.
    #[cfg(test)]
    pub fn from_connection_for_test(conn: Connection) -> Self {
        Self { conn }
    }

    pub async fn begin(&self) -> Result<(), SchemaError> {
        self.conn
            .execute("BEGIN TRANSACTION", ())
            .await
            .map_err(SchemaError::Transaction)?;
        Ok(())
    }

    pub async fn commit(&self) -> Result<(), SchemaError> {
        self.conn
            .execute("COMMIT", ())
            .await
            .map_err(SchemaError::Transaction)?;
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), SchemaError> {
        // Best-effort: a failed rollback still leaves no transaction open
        // that this process can meaningfully recover from.
        let _ = self.conn.execute("ROLLBACK", ()).await;
        Ok(())
    }

    /// The rowid of the most recent `INSERT` on this connection, used to
    /// read back surrogate keys (`repository_id`, `commit_id`, `file_id`).
    pub async fn last_insert_rowid(&self) -> Result<i64, turso::Error> {
        let mut stmt = self.conn.prepare("SELECT last_insert_rowid()").await?;
        let mut rows = stmt.query(()).await?;
        let row = rows.next().await?.expect("last_insert_rowid always returns a row");
        match row.get_value(0)? {
            Value::Integer(id) => Ok(id),
            other => panic!("last_insert_rowid returned non-integer value: {other:?}"),
        }
    }
}

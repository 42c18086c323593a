//! Migration trait and a tiny runner for schema evolution.
//!
//! Grounded in the teacher's `lsp-daemon` migration framework
//! (`Migration` trait + `MigrationRunner`), trimmed to what this indexer
//! needs: a single consolidated schema today, with room for a `v2` later
//! without changing how migrations are discovered or applied.

use sha2::{Digest, Sha256};
use std::fmt;
use turso::{Connection, Value};

/// A versioned, checksummed unit of schema DDL.
pub trait Migration: fmt::Debug + Send + Sync {
    fn version(&self) -> u32;
    fn name(&self) -> &str;
    fn up_sql(&self) -> &str;

    /// SHA-256 of version + name + SQL, used to detect drift between the
    /// migration shipped in the binary and the one recorded as applied.
    fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version().to_string().as_bytes());
        hasher.update(self.name().as_bytes());
        hasher.update(self.up_sql().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug)]
pub struct V1CompleteSchema;

impl Migration for V1CompleteSchema {
    fn version(&self) -> u32 {
        1
    }

    fn name(&self) -> &str {
        "complete_schema"
    }

    fn up_sql(&self) -> &str {
        include_str!("schema_v1.sql")
    }
}

pub fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![Box::new(V1CompleteSchema)]
}

/// Ensure the `schema_migrations` ledger exists, then apply any migration
/// whose version is greater than what's recorded. Each migration runs
/// inside its own transaction.
pub async fn run_migrations(conn: &Connection) -> Result<(), turso::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            checksum TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )
    .await?;

    let current = current_version(conn).await?;

    for migration in all_migrations() {
        if migration.version() <= current {
            continue;
        }

        conn.execute("BEGIN TRANSACTION", ()).await?;

        let apply = async {
            for statement in split_statements(migration.up_sql()) {
                conn.execute(&statement, ()).await?;
            }
            conn.execute(
                "INSERT INTO schema_migrations (version, name, checksum) VALUES (?, ?, ?)",
                vec![
                    Value::Integer(migration.version() as i64),
                    Value::Text(migration.name().to_string()),
                    Value::Text(migration.checksum()),
                ],
            )
            .await?;
            Ok::<(), turso::Error>(())
        }
        .await;

        match apply {
            Ok(()) => conn.execute("COMMIT", ()).await?,
            Err(e) => {
                conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        };
    }

    Ok(())
}

async fn current_version(conn: &Connection) -> Result<u32, turso::Error> {
    let mut stmt = conn
        .prepare("SELECT MAX(version) FROM schema_migrations")
        .await?;
    let mut rows = stmt.query(()).await?;
    if let Some(row) = rows.next().await? {
        match row.get_value(0)? {
            Value::Integer(v) => Ok(v as u32),
            _ => Ok(0),
        }
    } else {
        Ok(0)
    }
}

/// Split a migration's SQL text on semicolon-terminated statement
/// boundaries, skipping blank lines and `--` comments, so each DDL
/// statement can be sent to the engine individually.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');
        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

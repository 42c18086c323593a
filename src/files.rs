//! File & Change Store: global path interning and the commit<->file relation.

use crate::db::Database;
use turso::Value;

/// Read-through interning: look up `path` by its unique name, inserting a
/// new row on miss. Paths are taken verbatim; no normalization is applied.
pub async fn get_file_id(db: &Database, path: &str) -> Result<i64, turso::Error> {
    let mut stmt = db
        .conn()
        .prepare("SELECT file_id FROM files WHERE name = ?")
        .await?;
    let mut rows = stmt.query(vec![Value::Text(path.to_string())]).await?;
    if let Some(row) = rows.next().await? {
        return match row.get_value(0)? {
            Value::Integer(id) => Ok(id),
            other => panic!("file_id column held non-integer value: {other:?}"),
        };
    }

    db.conn()
        .execute(
            "INSERT INTO files (name) VALUES (?)",
            vec![Value::Text(path.to_string())],
        )
        .await?;
    db.last_insert_rowid().await
}

/// Record that `commit_id` touched `file_id`. Pure relation, no duplicates
/// expected (a commit's `log --name-only` output lists each path once).
pub async fn insert_change(db: &Database, commit_id: i64, file_id: i64) -> Result<(), turso::Error> {
    db.conn()
        .execute(
            "INSERT OR IGNORE INTO changes (commit_id, file_id) VALUES (?, ?)",
            vec![Value::Integer(commit_id), Value::Integer(file_id)],
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migration::run_migrations;
    use crate::{commit, repository};
    use turso::Builder;

    async fn memory_db() -> Database {
        let database = Builder::new_local(":memory:").build().await.unwrap();
        let conn = database.connect().unwrap();
        run_migrations(&conn).await.unwrap();
        Database::from_connection_for_test(conn)
    }

    #[tokio::test]
    async fn interning_is_stable_and_distinct() {
        let db = memory_db().await;
        let a1 = get_file_id(&db, "src/main.rs").await.unwrap();
        let a2 = get_file_id(&db, "src/main.rs").await.unwrap();
        let b = get_file_id(&db, "src/lib.rs").await.unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[tokio::test]
    async fn changes_are_not_duplicated() {
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        let commit_id = commit::insert_commit(&db, repo, "a", None).await.unwrap().unwrap();
        let file_id = get_file_id(&db, "README.md").await.unwrap();

        insert_change(&db, commit_id, file_id).await.unwrap();
        insert_change(&db, commit_id, file_id).await.unwrap();

        let mut stmt = db
            .conn()
            .prepare("SELECT COUNT(*) FROM changes WHERE commit_id = ? AND file_id = ?")
            .await
            .unwrap();
        let mut rows = stmt
            .query(vec![Value::Integer(commit_id), Value::Integer(file_id)])
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get_value(0).unwrap(), Value::Integer(1));
    }
}

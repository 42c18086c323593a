//! Repository Registry: upsert and delete of the `repositories` row that
//! every other table hangs off via `repository_id`.

use crate::db::Database;
use turso::Value;

/// Insert a new repository row, or update `path`/`head` if `name` already
/// exists, then return its stable surrogate id.
pub async fn upsert(
    db: &Database,
    name: &str,
    path: &str,
    head: Option<&str>,
) -> Result<i64, turso::Error> {
    db.conn()
        .execute(
            "INSERT INTO repositories (name, path, head) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET path = excluded.path, head = excluded.head",
            vec![
                Value::Text(name.to_string()),
                Value::Text(path.to_string()),
                head.map(|h| Value::Text(h.to_string())).unwrap_or(Value::Null),
            ],
        )
        .await?;

    let mut stmt = db
        .conn()
        .prepare("SELECT repository_id FROM repositories WHERE name = ?")
        .await?;
    let mut rows = stmt.query(vec![Value::Text(name.to_string())]).await?;
    let row = rows
        .next()
        .await?
        .expect("row just upserted must be readable back");
    match row.get_value(0)? {
        Value::Integer(id) => Ok(id),
        other => panic!("repository_id column held non-integer value: {other:?}"),
    }
}

/// Remove a repository row by name. Dependent rows (commits, refs, ...) are
/// left to the schema's own foreign-key discipline; no extra cleanup query
/// is issued here, matching the spec's "no additional cleanup" contract.
pub async fn delete(db: &Database, name: &str) -> Result<bool, turso::Error> {
    let affected = db
        .conn()
        .execute(
            "DELETE FROM repositories WHERE name = ?",
            vec![Value::Text(name.to_string())],
        )
        .await?;
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migration::run_migrations;
    use turso::Builder;

    async fn memory_db() -> Database {
        let database = Builder::new_local(":memory:").build().await.unwrap();
        let conn = database.connect().unwrap();
        run_migrations(&conn).await.unwrap();
        Database::from_connection_for_test(conn)
    }

    #[tokio::test]
    async fn upsert_is_stable_across_repeats() {
        let db = memory_db().await;
        let id1 = upsert(&db, "acme", "/srv/acme.git", None).await.unwrap();
        let id2 = upsert(&db, "acme", "/srv/acme.git", Some("deadbeef")).await.unwrap();
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn delete_then_recreate_gets_a_fresh_id() {
        let db = memory_db().await;
        let id1 = upsert(&db, "acme", "/srv/acme.git", None).await.unwrap();
        assert!(delete(&db, "acme").await.unwrap());
        let id2 = upsert(&db, "acme", "/srv/acme.git", None).await.unwrap();
        assert_ne!(id1, id2);
    }
}

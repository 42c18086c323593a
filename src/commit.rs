//! Commit Store, Generation Propagator, and Ancestor Skip-List.
//!
//! The spec's C-flavoured sentinels (`id | 0` for "already present" /
//! "absent") become `Option<i64>`: `None` is the Rust-idiomatic stand-in for
//! the `0` the source returns, and callers branch on it the same way.
//!
//! The skip-list is built in application code rather than via a database
//! trigger, per the alternative design explicitly sanctioned for this case:
//! each call to [`propagate_generation`] that actually assigns a generation
//! also walks the previous exponent level to materialize the next one,
//! inside the same transaction the caller already holds open.

use crate::db::Database;
use turso::Value;

/// Look up a commit's surrogate id by its logical identity.
pub async fn get_commit_id(
    db: &Database,
    repository_id: i64,
    hash: &str,
) -> Result<Option<i64>, turso::Error> {
    let mut stmt = db
        .conn()
        .prepare("SELECT commit_id FROM commits WHERE repository_id = ? AND commit_hash = ?")
        .await?;
    let mut rows = stmt
        .query(vec![Value::Integer(repository_id), Value::Text(hash.to_string())])
        .await?;
    match rows.next().await? {
        Some(row) => match row.get_value(0)? {
            Value::Integer(id) => Ok(Some(id)),
            other => panic!("commit_id column held non-integer value: {other:?}"),
        },
        None => Ok(None),
    }
}

/// Insert a commit if it isn't already present. Returns `None` if the
/// `(repository_id, commit_hash)` pair already exists (the caller's signal
/// that there is nothing new to walk past this point). A root commit
/// (`parent_hash.is_none()`) is inserted with `generation = 0` directly;
/// any other commit starts with `generation = NULL`.
pub async fn insert_commit(
    db: &Database,
    repository_id: i64,
    hash: &str,
    parent_hash: Option<&str>,
) -> Result<Option<i64>, turso::Error> {
    if get_commit_id(db, repository_id, hash).await?.is_some() {
        return Ok(None);
    }

    let generation = if parent_hash.is_none() {
        Value::Integer(0)
    } else {
        Value::Null
    };

    db.conn()
        .execute(
            "INSERT INTO commits (repository_id, commit_hash, parent_hash, generation)
             VALUES (?, ?, ?, ?)",
            vec![
                Value::Integer(repository_id),
                Value::Text(hash.to_string()),
                parent_hash.map(|p| Value::Text(p.to_string())).unwrap_or(Value::Null),
                generation,
            ],
        )
        .await?;

    Ok(Some(db.last_insert_rowid().await?))
}

/// Set `commits.generation` for `commit_id` if (and only if) its recorded
/// parent already has a non-NULL generation. Returns whether the update
/// fired. When it does, also materializes this commit's ancestor skip-list
/// rows in the same transaction.
///
/// Must be called inside a transaction the caller controls; it never opens
/// or closes one itself, so several of these can be batched per commit
/// alongside the change rows for that commit (see the enumerator).
pub async fn propagate_generation(
    db: &Database,
    repository_id: i64,
    commit_id: i64,
) -> Result<bool, turso::Error> {
    let affected = db
        .conn()
        .execute(
            "UPDATE commits
             SET generation = (
                 SELECT p.generation + 1 FROM commits p
                 WHERE p.repository_id = commits.repository_id
                   AND p.commit_hash = commits.parent_hash
             )
             WHERE commit_id = ?
               AND generation IS NULL
               AND EXISTS (
                   SELECT 1 FROM commits p
                   WHERE p.repository_id = commits.repository_id
                     AND p.commit_hash = commits.parent_hash
                     AND p.generation IS NOT NULL
               )",
            vec![Value::Integer(commit_id)],
        )
        .await?;

    if affected == 0 {
        return Ok(false);
    }

    build_skip_list(db, repository_id, commit_id).await?;
    Ok(true)
}

async fn build_skip_list(
    db: &Database,
    repository_id: i64,
    commit_id: i64,
) -> Result<(), turso::Error> {
    let parent_hash = match parent_hash_of(db, commit_id).await? {
        Some(hash) => hash,
        None => return Ok(()), // root: no parent, nothing to lift over
    };
    let parent_id = get_commit_id(db, repository_id, &parent_hash)
        .await?
        .expect("parent must already be assigned a generation, hence already stored");

    insert_ancestor(db, commit_id, 0, parent_id).await?;

    let mut exponent: i64 = 1;
    loop {
        let ancestor_at_prev = get_ancestor(db, commit_id, exponent - 1).await?;
        let Some(ancestor_at_prev) = ancestor_at_prev else {
            break;
        };
        let Some(great_ancestor) = get_ancestor(db, ancestor_at_prev, exponent - 1).await? else {
            break;
        };
        insert_ancestor(db, commit_id, exponent, great_ancestor).await?;
        exponent += 1;
    }

    Ok(())
}

async fn parent_hash_of(db: &Database, commit_id: i64) -> Result<Option<String>, turso::Error> {
    let mut stmt = db
        .conn()
        .prepare("SELECT parent_hash FROM commits WHERE commit_id = ?")
        .await?;
    let mut rows = stmt.query(vec![Value::Integer(commit_id)]).await?;
    let row = rows.next().await?.expect("commit_id must exist");
    match row.get_value(0)? {
        Value::Text(hash) => Ok(Some(hash)),
        Value::Null => Ok(None),
        other => panic!("parent_hash column held unexpected value: {other:?}"),
    }
}

async fn get_ancestor(
    db: &Database,
    commit_id: i64,
    exponent: i64,
) -> Result<Option<i64>, turso::Error> {
    let mut stmt = db
        .conn()
        .prepare("SELECT ancestor_id FROM ancestors WHERE commit_id = ? AND exponent = ?")
        .await?;
    let mut rows = stmt
        .query(vec![Value::Integer(commit_id), Value::Integer(exponent)])
        .await?;
    match rows.next().await? {
        Some(row) => match row.get_value(0)? {
            Value::Integer(id) => Ok(Some(id)),
            other => panic!("ancestor_id column held non-integer value: {other:?}"),
        },
        None => Ok(None),
    }
}

async fn insert_ancestor(
    db: &Database,
    commit_id: i64,
    exponent: i64,
    ancestor_id: i64,
) -> Result<(), turso::Error> {
    db.conn()
        .execute(
            "INSERT INTO ancestors (commit_id, exponent, ancestor_id) VALUES (?, ?, ?)",
            vec![
                Value::Integer(commit_id),
                Value::Integer(exponent),
                Value::Integer(ancestor_id),
            ],
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migration::run_migrations;
    use crate::repository;
    use turso::Builder;

    async fn memory_db() -> Database {
        let database = Builder::new_local(":memory:").build().await.unwrap();
        let conn = database.connect().unwrap();
        run_migrations(&conn).await.unwrap();
        Database::from_connection_for_test(conn)
    }

    /// Build a linear chain root <- c1 <- c2 <- ... and propagate
    /// generations in insertion order, mimicking the enumerator's
    /// forward-topological walk.
    async fn insert_chain(db: &Database, repo: i64, hashes: &[&str]) -> Vec<i64> {
        let mut ids = Vec::new();
        let mut parent: Option<&str> = None;
        for hash in hashes {
            let id = insert_commit(db, repo, hash, parent)
                .await
                .unwrap()
                .expect("fresh hash must insert");
            ids.push(id);
            parent = Some(hash);
        }
        for &id in &ids {
            propagate_generation(db, repo, id).await.unwrap();
        }
        ids
    }

    #[tokio::test]
    async fn root_gets_generation_zero_at_insert() {
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        let id = insert_commit(&db, repo, "a", None).await.unwrap().unwrap();

        let mut stmt = db
            .conn()
            .prepare("SELECT generation FROM commits WHERE commit_id = ?")
            .await
            .unwrap();
        let mut rows = stmt.query(vec![Value::Integer(id)]).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get_value(0).unwrap(), Value::Integer(0));
    }

    #[tokio::test]
    async fn duplicate_insert_returns_none() {
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        insert_commit(&db, repo, "a", None).await.unwrap().unwrap();
        let second = insert_commit(&db, repo, "a", None).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn skip_list_matches_binary_lifting_s1() {
        // A <- B <- C, matching spec scenario S1.
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        let ids = insert_chain(&db, repo, &["a", "b", "c"]).await;
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        assert_eq!(get_ancestor(&db, b, 0).await.unwrap(), Some(a));
        assert_eq!(get_ancestor(&db, c, 0).await.unwrap(), Some(b));
        assert_eq!(get_ancestor(&db, c, 1).await.unwrap(), Some(a));
        assert_eq!(get_ancestor(&db, c, 2).await.unwrap(), None);
        assert_eq!(get_ancestor(&db, a, 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn incremental_extension_adds_expected_skip_list_rows_s3() {
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        let ids = insert_chain(&db, repo, &["a", "b", "c"]).await;
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        let d = insert_commit(&db, repo, "d", Some("c")).await.unwrap().unwrap();
        propagate_generation(&db, repo, d).await.unwrap();

        assert_eq!(get_ancestor(&db, d, 0).await.unwrap(), Some(c));
        assert_eq!(get_ancestor(&db, d, 1).await.unwrap(), Some(b));
        assert_eq!(get_ancestor(&db, d, 2).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn propagate_is_a_noop_until_parent_is_assigned() {
        let db = memory_db().await;
        let repo = repository::upsert(&db, "r", "/r.git", None).await.unwrap();
        // Insert child before its parent exists in the store at all, as the
        // Commit Walker does (newest to oldest).
        let child = insert_commit(&db, repo, "b", Some("a")).await.unwrap().unwrap();
        assert!(!propagate_generation(&db, repo, child).await.unwrap());

        insert_commit(&db, repo, "a", None).await.unwrap().unwrap();
        assert!(propagate_generation(&db, repo, child).await.unwrap());
    }
}

//! Tree rows.

use crate::model::Tree;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

const TREE_COLUMNS: &str = "tree_id, owner, name, created_at, updated_at";

/// Insert a tree and return the stored record.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_tree(conn: &Connection, owner: &str, name: &str) -> Result<Tree> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO trees (owner, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![owner, name, now],
    )
    .with_context(|| format!("insert tree '{name}' for '{owner}'"))?;

    let id = conn.last_insert_rowid();
    tracing::debug!(tree_id = id, owner, "inserted tree");

    Ok(Tree {
        id,
        owner: owner.to_string(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get_tree(conn: &Connection, tree_id: i64) -> Result<Option<Tree>> {
    conn.query_row(
        &format!("SELECT {TREE_COLUMNS} FROM trees WHERE tree_id = ?1"),
        params![tree_id],
        row_to_tree,
    )
    .optional()
    .with_context(|| format!("get_tree for {tree_id}"))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn tree_exists(conn: &Connection, tree_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM trees WHERE tree_id = ?1)",
        params![tree_id],
        |row| row.get(0),
    )
    .with_context(|| format!("tree_exists for {tree_id}"))
}

/// Trees belonging to `owner`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_trees_by_owner(conn: &Connection, owner: &str) -> Result<Vec<Tree>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TREE_COLUMNS} FROM trees WHERE owner = ?1 \
             ORDER BY created_at DESC, tree_id DESC"
        ))
        .context("prepare list_trees_by_owner query")?;

    let rows = stmt
        .query_map(params![owner], row_to_tree)
        .context("execute list_trees_by_owner query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read list_trees_by_owner rows")
}

/// Rename a tree. Returns `false` when no such tree exists.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn rename_tree(conn: &Connection, tree_id: i64, name: &str) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE trees SET name = ?2, updated_at = ?3 WHERE tree_id = ?1",
            params![tree_id, name, Utc::now()],
        )
        .with_context(|| format!("rename tree {tree_id}"))?;
    Ok(changed > 0)
}

/// Delete a tree together with its persons and their relationships.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_tree(conn: &Connection, tree_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM trees WHERE tree_id = ?1", params![tree_id])
        .with_context(|| format!("delete tree {tree_id}"))?;
    Ok(changed > 0)
}

fn row_to_tree(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tree> {
    Ok(Tree {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn insert_then_get_round_trips() {
        let conn = open_in_memory().expect("db");
        let tree = insert_tree(&conn, "alice", "Lovelace").expect("insert");
        let loaded = get_tree(&conn, tree.id).expect("query").expect("present");
        assert_eq!(loaded, tree);
        assert!(tree_exists(&conn, tree.id).expect("exists"));
        assert!(get_tree(&conn, tree.id + 1).expect("query").is_none());
    }

    #[test]
    fn list_is_scoped_to_owner_newest_first() {
        let conn = open_in_memory().expect("db");
        let first = insert_tree(&conn, "alice", "First").expect("insert");
        let second = insert_tree(&conn, "alice", "Second").expect("insert");
        insert_tree(&conn, "bob", "Other").expect("insert");

        let ids: Vec<i64> = list_trees_by_owner(&conn, "alice")
            .expect("list")
            .iter()
            .map(|tree| tree.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(list_trees_by_owner(&conn, "carol").expect("list").is_empty());
    }

    #[test]
    fn rename_and_delete_report_missing_rows() {
        let conn = open_in_memory().expect("db");
        let tree = insert_tree(&conn, "alice", "Old").expect("insert");

        assert!(rename_tree(&conn, tree.id, "New").expect("rename"));
        let renamed = get_tree(&conn, tree.id).expect("query").expect("present");
        assert_eq!(renamed.name, "New");
        assert!(renamed.updated_at >= tree.updated_at);

        assert!(!rename_tree(&conn, 999, "Nope").expect("rename"));
        assert!(delete_tree(&conn, tree.id).expect("delete"));
        assert!(!delete_tree(&conn, tree.id).expect("delete"));
    }
}

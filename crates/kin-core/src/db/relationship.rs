//! Relationship rows and the candidate queries built on them.

use super::person::{PERSON_COLUMNS, query_persons};
use crate::model::{Person, Relationship, RelationshipType};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};

const RELATIONSHIP_COLUMNS: &str =
    "r.relationship_id, r.parent_id, r.child_id, r.relationship_type, r.created_at";

impl ToSql for RelationshipType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RelationshipType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Insert a `parent -> child` edge.
///
/// # Errors
///
/// Returns an error if the insert fails, including UNIQUE/CHECK violations.
pub fn insert_relationship(
    conn: &Connection,
    parent_id: i64,
    child_id: i64,
    relationship_type: RelationshipType,
) -> Result<Relationship> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO relationships (parent_id, child_id, relationship_type, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![parent_id, child_id, relationship_type, now],
    )
    .with_context(|| format!("insert relationship {parent_id} -> {child_id}"))?;

    let id = conn.last_insert_rowid();
    tracing::debug!(relationship_id = id, parent_id, child_id, %relationship_type, "inserted relationship");

    Ok(Relationship {
        id,
        parent_id,
        child_id,
        relationship_type,
        created_at: now,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn find_relationship(
    conn: &Connection,
    parent_id: i64,
    child_id: i64,
) -> Result<Option<Relationship>> {
    conn.query_row(
        &format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships r \
             WHERE r.parent_id = ?1 AND r.child_id = ?2"
        ),
        params![parent_id, child_id],
        row_to_relationship,
    )
    .optional()
    .with_context(|| format!("find_relationship {parent_id} -> {child_id}"))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn relationship_exists(conn: &Connection, parent_id: i64, child_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM relationships WHERE parent_id = ?1 AND child_id = ?2)",
        params![parent_id, child_id],
        |row| row.get(0),
    )
    .with_context(|| format!("relationship_exists {parent_id} -> {child_id}"))
}

/// Delete the `parent -> child` edge. Returns `false` when it did not exist.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_relationship(conn: &Connection, parent_id: i64, child_id: i64) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM relationships WHERE parent_id = ?1 AND child_id = ?2",
            params![parent_id, child_id],
        )
        .with_context(|| format!("delete relationship {parent_id} -> {child_id}"))?;
    Ok(changed > 0)
}

/// Edges leaving `parent_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_parent(conn: &Connection, parent_id: i64) -> Result<Vec<Relationship>> {
    query_relationships(
        conn,
        &format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships r \
             WHERE r.parent_id = ?1 ORDER BY r.relationship_id"
        ),
        params![parent_id],
    )
    .context("list_by_parent")
}

/// Edges entering `child_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_child(conn: &Connection, child_id: i64) -> Result<Vec<Relationship>> {
    query_relationships(
        conn,
        &format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships r \
             WHERE r.child_id = ?1 ORDER BY r.relationship_id"
        ),
        params![child_id],
    )
    .context("list_by_child")
}

/// Every edge whose parent belongs to `tree_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_tree(conn: &Connection, tree_id: i64) -> Result<Vec<Relationship>> {
    query_relationships(
        conn,
        &format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships r \
             JOIN persons p ON p.person_id = r.parent_id \
             WHERE p.tree_id = ?1 ORDER BY r.relationship_id"
        ),
        params![tree_id],
    )
    .context("list_by_tree")
}

/// Parents of `child_id`, in link order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn parents_of(conn: &Connection, child_id: i64) -> Result<Vec<Person>> {
    query_persons(
        conn,
        &format!(
            "SELECT {PERSON_COLUMNS} FROM persons p \
             JOIN relationships r ON r.parent_id = p.person_id \
             WHERE r.child_id = ?1 ORDER BY r.relationship_id"
        ),
        params![child_id],
    )
    .context("parents_of")
}

/// Children of `parent_id`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn children_of(conn: &Connection, parent_id: i64) -> Result<Vec<Person>> {
    query_persons(
        conn,
        &format!(
            "SELECT {PERSON_COLUMNS} FROM persons p \
             JOIN relationships r ON r.child_id = p.person_id \
             WHERE r.parent_id = ?1 \
             ORDER BY p.birth_date IS NULL ASC, p.birth_date ASC, p.person_id ASC"
        ),
        params![parent_id],
    )
    .context("children_of")
}

/// Persons that could be linked as a child of `parent`.
///
/// Same tree, not the parent, born strictly after the parent, not already a
/// child of the parent, and fewer than two parents. Persons without a birth
/// date never qualify, and nobody qualifies for a parent without one.
/// Ordered by birth date then id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn available_children(conn: &Connection, parent: &Person) -> Result<Vec<Person>> {
    query_persons(
        conn,
        &format!(
            "SELECT {PERSON_COLUMNS} FROM persons p \
             WHERE p.tree_id = ?1 \
               AND p.person_id <> ?2 \
               AND p.birth_date > ?3 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM relationships r \
                   WHERE r.parent_id = ?2 AND r.child_id = p.person_id) \
               AND (SELECT COUNT(*) FROM relationships r WHERE r.child_id = p.person_id) < 2 \
             ORDER BY p.birth_date ASC, p.person_id ASC"
        ),
        params![parent.tree_id, parent.id, parent.birth_date],
    )
    .context("available_children")
}

/// Persons that could be linked as a parent of `child`.
///
/// Same tree, not the child, born strictly before the child, not already a
/// parent of the child. With one existing parent only the opposite sex
/// qualifies; with two, nobody does. Birth-date rules as in
/// [`available_children`]. Ordered by birth date descending then id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn available_parents(conn: &Connection, child: &Person) -> Result<Vec<Person>> {
    query_persons(
        conn,
        &format!(
            "WITH existing AS ( \
                 SELECT ep.person_id, ep.is_male FROM relationships r \
                 JOIN persons ep ON ep.person_id = r.parent_id \
                 WHERE r.child_id = ?2) \
             SELECT {PERSON_COLUMNS} FROM persons p \
             WHERE p.tree_id = ?1 \
               AND p.person_id <> ?2 \
               AND p.birth_date < ?3 \
               AND p.person_id NOT IN (SELECT person_id FROM existing) \
               AND (SELECT COUNT(*) FROM existing) < 2 \
               AND NOT EXISTS (SELECT 1 FROM existing e WHERE e.is_male = p.is_male) \
             ORDER BY p.birth_date DESC, p.person_id ASC"
        ),
        params![child.tree_id, child.id, child.birth_date],
    )
    .context("available_parents")
}

fn query_relationships(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Relationship>> {
    let mut stmt = conn.prepare(sql).context("prepare relationship query")?;
    let rows = stmt
        .query_map(params, row_to_relationship)
        .context("execute relationship query")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read relationship rows")
}

fn row_to_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        child_id: row.get(2)?,
        relationship_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

//! Person rows.

use crate::model::{Person, PersonFields};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

/// Column list for `persons p`, in [`row_to_person`] order.
pub(crate) const PERSON_COLUMNS: &str = "p.person_id, p.tree_id, p.first_name, p.last_name, \
     p.birth_date, p.death_date, p.is_male, p.biography, p.created_at, p.updated_at";

/// Sort order for person listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonOrder {
    /// Oldest birth date first, unknown dates last, ties by id.
    #[default]
    BirthAsc,
    /// Most recently created first.
    CreatedDesc,
}

impl PersonOrder {
    const fn sql_clause(self) -> &'static str {
        match self {
            Self::BirthAsc => {
                "ORDER BY p.birth_date IS NULL ASC, p.birth_date ASC, p.person_id ASC"
            }
            Self::CreatedDesc => "ORDER BY p.created_at DESC, p.person_id DESC",
        }
    }
}

/// Insert a person into `tree_id` and return the stored record.
///
/// # Errors
///
/// Returns an error if the insert fails (including an unknown `tree_id`).
pub fn insert_person(conn: &Connection, tree_id: i64, fields: &PersonFields) -> Result<Person> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO persons (
            tree_id, first_name, last_name, birth_date, death_date,
            is_male, biography, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            tree_id,
            fields.first_name,
            fields.last_name,
            fields.birth_date,
            fields.death_date,
            fields.is_male,
            fields.biography,
            now,
        ],
    )
    .with_context(|| format!("insert person into tree {tree_id}"))?;

    let id = conn.last_insert_rowid();
    tracing::debug!(person_id = id, tree_id, "inserted person");

    Ok(Person {
        id,
        tree_id,
        first_name: fields.first_name.clone(),
        last_name: fields.last_name.clone(),
        birth_date: fields.birth_date,
        death_date: fields.death_date,
        is_male: fields.is_male,
        biography: fields.biography.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get_person(conn: &Connection, person_id: i64) -> Result<Option<Person>> {
    conn.query_row(
        &format!("SELECT {PERSON_COLUMNS} FROM persons p WHERE p.person_id = ?1"),
        params![person_id],
        row_to_person,
    )
    .optional()
    .with_context(|| format!("get_person for {person_id}"))
}

/// All persons of one tree in the requested order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_persons(conn: &Connection, tree_id: i64, order: PersonOrder) -> Result<Vec<Person>> {
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM persons p WHERE p.tree_id = ?1 {}",
        order.sql_clause()
    );
    query_persons(conn, &sql, params![tree_id]).context("list_persons")
}

/// Overwrite the mutable attributes of a person; `tree_id` is untouched.
///
/// Returns `false` when no such person exists.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_person(conn: &Connection, person_id: i64, fields: &PersonFields) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE persons SET
                first_name = ?2, last_name = ?3, birth_date = ?4, death_date = ?5,
                is_male = ?6, biography = ?7, updated_at = ?8
             WHERE person_id = ?1",
            params![
                person_id,
                fields.first_name,
                fields.last_name,
                fields.birth_date,
                fields.death_date,
                fields.is_male,
                fields.biography,
                Utc::now(),
            ],
        )
        .with_context(|| format!("update person {person_id}"))?;
    Ok(changed > 0)
}

/// Delete a person; incident relationships go with it.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_person(conn: &Connection, person_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM persons WHERE person_id = ?1", params![person_id])
        .with_context(|| format!("delete person {person_id}"))?;
    Ok(changed > 0)
}

pub(crate) fn query_persons(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare(sql).context("prepare person query")?;
    let rows = stmt
        .query_map(params, row_to_person)
        .context("execute person query")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read person rows")
}

pub(crate) fn row_to_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        tree_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        death_date: row.get(5)?,
        is_male: row.get(6)?,
        biography: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, tree::insert_tree};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn insert_then_get_round_trips_dates() {
        let conn = open_in_memory().expect("db");
        let tree = insert_tree(&conn, "alice", "T").expect("tree");
        let fields = PersonFields::new("Ada", "Lovelace")
            .born(date(1815, 12, 10))
            .died(date(1852, 11, 27))
            .biography("Analyst");
        let person = insert_person(&conn, tree.id, &fields).expect("insert");

        let loaded = get_person(&conn, person.id).expect("query").expect("present");
        assert_eq!(loaded, person);
        assert_eq!(loaded.fields(), fields);
    }

    #[test]
    fn insert_into_missing_tree_fails() {
        let conn = open_in_memory().expect("db");
        assert!(insert_person(&conn, 42, &PersonFields::new("A", "B")).is_err());
    }

    #[test]
    fn birth_order_puts_unknown_dates_last() {
        let conn = open_in_memory().expect("db");
        let tree = insert_tree(&conn, "alice", "T").expect("tree");
        let unknown = insert_person(&conn, tree.id, &PersonFields::new("U", "X")).expect("p");
        let young =
            insert_person(&conn, tree.id, &PersonFields::new("Y", "X").born(date(2000, 1, 1)))
                .expect("p");
        let old =
            insert_person(&conn, tree.id, &PersonFields::new("O", "X").born(date(1900, 1, 1)))
                .expect("p");

        let ids: Vec<i64> = list_persons(&conn, tree.id, PersonOrder::BirthAsc)
            .expect("list")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![old.id, young.id, unknown.id]);

        let ids: Vec<i64> = list_persons(&conn, tree.id, PersonOrder::CreatedDesc)
            .expect("list")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![old.id, young.id, unknown.id]);
    }

    #[test]
    fn update_and_delete_report_missing_rows() {
        let conn = open_in_memory().expect("db");
        let tree = insert_tree(&conn, "alice", "T").expect("tree");
        let person = insert_person(&conn, tree.id, &PersonFields::new("A", "B")).expect("p");

        let edited = PersonFields::new("Alice", "B").male(true);
        assert!(update_person(&conn, person.id, &edited).expect("update"));
        let loaded = get_person(&conn, person.id).expect("query").expect("present");
        assert_eq!(loaded.first_name, "Alice");
        assert!(loaded.is_male);
        assert_eq!(loaded.tree_id, tree.id);

        assert!(!update_person(&conn, 999, &edited).expect("update"));
        assert!(delete_person(&conn, person.id).expect("delete"));
        assert!(get_person(&conn, person.id).expect("query").is_none());
        assert!(!delete_person(&conn, person.id).expect("delete"));
    }
}

use super::{ServiceContext, TreeService, load_person};
use crate::db;
use crate::db::person::PersonOrder;
use crate::error::{KinError, KinResult};
use crate::model::{Person, PersonFields};
use crate::validate::{RelativesCheck, check_relatives, validate_person_fields};
use rusqlite::Connection;
use tracing::{info, instrument};

pub struct PersonService<'a> {
    conn: &'a Connection,
    ctx: &'a ServiceContext,
}

impl<'a> PersonService<'a> {
    pub const fn new(conn: &'a Connection, ctx: &'a ServiceContext) -> Self {
        Self { conn, ctx }
    }

    /// Create a person in `tree_id`.
    ///
    /// # Errors
    ///
    /// Tree lookup errors, or `Validation`/`Chronology` for bad fields.
    #[instrument(skip(self, fields))]
    pub fn create_person(&self, tree_id: i64, fields: PersonFields) -> KinResult<Person> {
        self.trees().get_tree(tree_id)?;
        let fields = fields.normalized();
        validate_person_fields(&fields, self.ctx.today)?;

        let person = db::person::insert_person(self.conn, tree_id, &fields)?;
        info!(person_id = person.id, tree_id, "created person");
        Ok(person)
    }

    /// # Errors
    ///
    /// `PersonNotFound` or `Validation` for a non-positive id.
    pub fn get_person(&self, person_id: i64) -> KinResult<Person> {
        load_person(self.conn, person_id)
    }

    /// Persons of a tree, newest first.
    ///
    /// # Errors
    ///
    /// Tree lookup errors.
    #[instrument(skip(self))]
    pub fn list_persons(&self, tree_id: i64) -> KinResult<Vec<Person>> {
        self.trees().get_tree(tree_id)?;
        Ok(db::person::list_persons(
            self.conn,
            tree_id,
            PersonOrder::CreatedDesc,
        )?)
    }

    /// Replace the editable fields of a person. The tree never changes.
    ///
    /// # Errors
    ///
    /// `PersonNotFound`, `Validation`/`Chronology` for bad fields, and
    /// `Chronology`/`GenderConflict` when the edit would break one of the
    /// person's existing links.
    #[instrument(skip(self, fields))]
    pub fn update_person(&self, person_id: i64, fields: PersonFields) -> KinResult<Person> {
        let current = load_person(self.conn, person_id)?;
        let fields = fields.normalized();
        validate_person_fields(&fields, self.ctx.today)?;

        let parents = db::relationship::parents_of(self.conn, person_id)?;
        let children = db::relationship::children_of(self.conn, person_id)?;
        let mut co_parents = Vec::new();
        for child in &children {
            co_parents.extend(
                db::relationship::parents_of(self.conn, child.id)?
                    .into_iter()
                    .filter(|p| p.id != person_id),
            );
        }
        check_relatives(
            &RelativesCheck {
                current: &current,
                parents: &parents,
                children: &children,
                co_parents: &co_parents,
            },
            &fields,
        )?;

        if !db::person::update_person(self.conn, person_id, &fields)? {
            return Err(KinError::PersonNotFound(person_id));
        }
        info!(person_id, "updated person");
        load_person(self.conn, person_id)
    }

    /// Delete a person together with every relationship touching them.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` or `Validation` for a non-positive id.
    #[instrument(skip(self))]
    pub fn delete_person(&self, person_id: i64) -> KinResult<()> {
        crate::validate::validate_id("person_id", person_id)?;
        if !db::person::delete_person(self.conn, person_id)? {
            return Err(KinError::PersonNotFound(person_id));
        }
        info!(person_id, "deleted person");
        Ok(())
    }

    /// # Errors
    ///
    /// `PersonNotFound` or `Validation` for a non-positive id.
    pub fn parents_of(&self, person_id: i64) -> KinResult<Vec<Person>> {
        load_person(self.conn, person_id)?;
        Ok(db::relationship::parents_of(self.conn, person_id)?)
    }

    /// # Errors
    ///
    /// `PersonNotFound` or `Validation` for a non-positive id.
    pub fn children_of(&self, person_id: i64) -> KinResult<Vec<Person>> {
        load_person(self.conn, person_id)?;
        Ok(db::relationship::children_of(self.conn, person_id)?)
    }

    const fn trees(&self) -> TreeService<'a> {
        TreeService::new(self.conn, self.ctx)
    }
}

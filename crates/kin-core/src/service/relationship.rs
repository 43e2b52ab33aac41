//! Creating and removing parent→child links.
//!
//! Every link path funnels through [`check_link`], so the same rules apply
//! whether both persons exist or one is created on the fly.

use super::{ServiceContext, load_person};
use crate::db;
use crate::error::{KinError, KinResult};
use crate::model::{Person, PersonFields, Relationship, RelationshipType};
use crate::validate::{Endpoint, LinkCheck, check_link, validate_id, validate_person_fields};
use anyhow::Context;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// A person created as part of a link, with the edge that joins them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedPerson {
    pub person: Person,
    pub relationship: Relationship,
}

pub struct RelationshipService<'a> {
    conn: &'a Connection,
    ctx: &'a ServiceContext,
}

impl<'a> RelationshipService<'a> {
    pub const fn new(conn: &'a Connection, ctx: &'a ServiceContext) -> Self {
        Self { conn, ctx }
    }

    /// Link an existing person as a child of `parent_id`.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for either side, then the first failing link rule.
    #[instrument(skip(self))]
    pub fn link_existing_child(
        &self,
        parent_id: i64,
        child_id: i64,
        relationship_type: &str,
    ) -> KinResult<Relationship> {
        self.create_edge(parent_id, child_id, relationship_type)
    }

    /// Link an existing person as a parent of `child_id`.
    ///
    /// # Errors
    ///
    /// As [`Self::link_existing_child`].
    #[instrument(skip(self))]
    pub fn link_existing_parent(
        &self,
        child_id: i64,
        parent_id: i64,
        relationship_type: &str,
    ) -> KinResult<Relationship> {
        self.create_edge(parent_id, child_id, relationship_type)
    }

    /// Create a new person in the parent's tree and link them as its child.
    ///
    /// The person and the edge are written in one transaction.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for the parent, field validation errors, then the
    /// first failing link rule.
    #[instrument(skip(self, child))]
    pub fn create_child_and_link(
        &self,
        parent_id: i64,
        child: PersonFields,
        relationship_type: &str,
    ) -> KinResult<LinkedPerson> {
        let parent = load_person(self.conn, parent_id)?;
        let child = child.normalized();
        validate_person_fields(&child, self.ctx.today)?;

        let kind = check_link(&LinkCheck {
            parent: (&parent).into(),
            child: Endpoint::pending(parent.tree_id, &child),
            relationship_type,
            existing_parents: &[],
            edge_exists: false,
        })?;

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin create-child transaction")?;
        let person = db::person::insert_person(&tx, parent.tree_id, &child)?;
        let relationship = db::relationship::insert_relationship(&tx, parent.id, person.id, kind)?;
        tx.commit().context("commit create-child transaction")?;

        info!(
            parent_id,
            child_id = person.id,
            relationship_id = relationship.id,
            "created child and linked"
        );
        Ok(LinkedPerson {
            person,
            relationship,
        })
    }

    /// Create a new person in the child's tree and link them as its parent.
    ///
    /// The child's existing parents are checked before anything is written;
    /// both writes share one transaction.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for the child, field validation errors, then the
    /// first failing link rule.
    #[instrument(skip(self, parent))]
    pub fn create_parent_and_link(
        &self,
        child_id: i64,
        parent: PersonFields,
        relationship_type: &str,
    ) -> KinResult<LinkedPerson> {
        let child = load_person(self.conn, child_id)?;
        let parent = parent.normalized();
        validate_person_fields(&parent, self.ctx.today)?;

        let existing = db::relationship::parents_of(self.conn, child.id)?;
        let kind = check_link(&LinkCheck {
            parent: Endpoint::pending(child.tree_id, &parent),
            child: (&child).into(),
            relationship_type,
            existing_parents: &existing,
            edge_exists: false,
        })?;

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin create-parent transaction")?;
        let person = db::person::insert_person(&tx, child.tree_id, &parent)?;
        let relationship = db::relationship::insert_relationship(&tx, person.id, child.id, kind)?;
        tx.commit().context("commit create-parent transaction")?;

        info!(
            child_id,
            parent_id = person.id,
            relationship_id = relationship.id,
            "created parent and linked"
        );
        Ok(LinkedPerson {
            person,
            relationship,
        })
    }

    /// Remove the `parent -> child` edge.
    ///
    /// # Errors
    ///
    /// `RelationshipNotFound` when there is no such edge.
    #[instrument(skip(self))]
    pub fn unlink(&self, parent_id: i64, child_id: i64) -> KinResult<()> {
        validate_id("parent_id", parent_id)?;
        validate_id("child_id", child_id)?;

        if !db::relationship::delete_relationship(self.conn, parent_id, child_id)? {
            return Err(KinError::RelationshipNotFound {
                parent_id,
                child_id,
            });
        }
        info!(parent_id, child_id, "unlinked");
        Ok(())
    }

    /// Persons that could become children of `parent_id`, oldest first.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for the parent.
    #[instrument(skip(self))]
    pub fn available_children(&self, parent_id: i64) -> KinResult<Vec<Person>> {
        let parent = load_person(self.conn, parent_id)?;
        Ok(db::relationship::available_children(self.conn, &parent)?)
    }

    /// Persons that could become parents of `child_id`, youngest first.
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for the child.
    #[instrument(skip(self))]
    pub fn available_parents(&self, child_id: i64) -> KinResult<Vec<Person>> {
        let child = load_person(self.conn, child_id)?;
        Ok(db::relationship::available_parents(self.conn, &child)?)
    }

    /// Edges touching `person_id`, as (parents, children).
    ///
    /// # Errors
    ///
    /// `PersonNotFound` for the person.
    pub fn edges_of(&self, person_id: i64) -> KinResult<(Vec<Relationship>, Vec<Relationship>)> {
        load_person(self.conn, person_id)?;
        Ok((
            db::relationship::list_by_child(self.conn, person_id)?,
            db::relationship::list_by_parent(self.conn, person_id)?,
        ))
    }

    fn create_edge(
        &self,
        parent_id: i64,
        child_id: i64,
        relationship_type: &str,
    ) -> KinResult<Relationship> {
        let parent = load_person(self.conn, parent_id)?;
        let child = load_person(self.conn, child_id)?;

        let existing = db::relationship::parents_of(self.conn, child.id)?;
        let edge_exists = db::relationship::relationship_exists(self.conn, parent.id, child.id)?;
        debug!(
            existing_parents = existing.len(),
            edge_exists, "checking link"
        );

        let kind: RelationshipType = check_link(&LinkCheck {
            parent: (&parent).into(),
            child: (&child).into(),
            relationship_type,
            existing_parents: &existing,
            edge_exists,
        })?;

        let relationship =
            db::relationship::insert_relationship(self.conn, parent.id, child.id, kind)?;
        info!(
            parent_id,
            child_id,
            relationship_id = relationship.id,
            %kind,
            "linked"
        );
        Ok(relationship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::Services;
    use crate::service::testing::{ctx, date, db};

    struct Fixture {
        conn: Connection,
        tree_id: i64,
    }

    impl Fixture {
        fn new() -> Self {
            let conn = db();
            let tree_id = Services::new(&conn, ctx())
                .trees()
                .create_tree("T")
                .expect("tree")
                .id;
            Self { conn, tree_id }
        }

        fn services(&self) -> Services<'_> {
            Services::new(&self.conn, ctx())
        }

        fn person(&self, first: &str, born: Option<(i32, u32, u32)>, is_male: bool) -> Person {
            let mut fields = PersonFields::new(first, "Doe").male(is_male);
            fields.birth_date = born.map(|(y, m, d)| date(y, m, d));
            self.services()
                .persons()
                .create_person(self.tree_id, fields)
                .expect("create person")
        }

        fn person_count(&self) -> i64 {
            self.conn
                .query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))
                .expect("count persons")
        }
    }

    #[test]
    fn family_scenario() {
        let f = Fixture::new();
        let p1 = f.person("P1", Some((1960, 1, 1)), true);
        let p2 = f.person("P2", Some((1962, 1, 1)), false);
        let c1 = f.person("C1", Some((1990, 1, 1)), false);
        let p3 = f.person("P3", Some((1963, 1, 1)), true);
        let services = f.services();
        let rels = services.relationships();

        rels.link_existing_child(p1.id, c1.id, "biological")
            .expect("first parent");
        rels.link_existing_parent(c1.id, p2.id, "biological")
            .expect("second parent");

        let err = rels
            .link_existing_child(p3.id, c1.id, "biological")
            .expect_err("third parent");
        assert_eq!(err.code(), ErrorCode::TooManyParents);

        let err = rels
            .link_existing_child(p1.id, c1.id, "biological")
            .expect_err("relink");
        assert_eq!(err.code(), ErrorCode::DuplicateRelationship);

        rels.unlink(p2.id, c1.id).expect("unlink");
        let err = rels
            .link_existing_child(p3.id, c1.id, "biological")
            .expect_err("same sex as P1");
        assert_eq!(err.code(), ErrorCode::GenderConflict);

        assert!(matches!(
            rels.unlink(p2.id, c1.id),
            Err(KinError::RelationshipNotFound { .. })
        ));
    }

    #[test]
    fn missing_persons_are_reported() {
        let f = Fixture::new();
        let p = f.person("P", None, true);
        let services = f.services();
        assert!(matches!(
            services.relationships().link_existing_child(p.id, 404, "biological"),
            Err(KinError::PersonNotFound(404))
        ));
        assert!(matches!(
            services.relationships().link_existing_child(404, p.id, "biological"),
            Err(KinError::PersonNotFound(404))
        ));
        assert!(matches!(
            services.relationships().available_children(404),
            Err(KinError::PersonNotFound(404))
        ));
    }

    #[test]
    fn cross_tree_links_are_rejected() {
        let f = Fixture::new();
        let services = f.services();
        let other = services.trees().create_tree("Other").expect("tree");
        let p = f.person("P", Some((1960, 1, 1)), true);
        let stranger = services
            .persons()
            .create_person(other.id, PersonFields::new("S", "X").born(date(1990, 1, 1)))
            .expect("create");

        let err = services
            .relationships()
            .link_existing_child(p.id, stranger.id, "biological")
            .expect_err("cross tree");
        assert_eq!(err.code(), ErrorCode::CrossTreeLink);
    }

    #[test]
    fn create_child_and_link_writes_both_rows() {
        let f = Fixture::new();
        let parent = f.person("P", Some((1960, 1, 1)), true);
        let services = f.services();

        let linked = services
            .relationships()
            .create_child_and_link(
                parent.id,
                PersonFields::new("Kid", "Doe").born(date(1990, 1, 1)),
                "not_biological",
            )
            .expect("create and link");
        assert_eq!(linked.person.tree_id, f.tree_id);
        assert_eq!(linked.relationship.parent_id, parent.id);
        assert_eq!(linked.relationship.child_id, linked.person.id);
        assert_eq!(
            linked.relationship.relationship_type,
            RelationshipType::NotBiological
        );
        assert_eq!(
            services.persons().children_of(parent.id).expect("children")[0].id,
            linked.person.id
        );
    }

    #[test]
    fn failed_create_and_link_leaves_no_person() {
        let f = Fixture::new();
        let parent = f.person("P", Some((1960, 1, 1)), true);
        let before = f.person_count();
        let services = f.services();

        let err = services
            .relationships()
            .create_child_and_link(
                parent.id,
                PersonFields::new("Kid", "Doe").born(date(1950, 1, 1)),
                "biological",
            )
            .expect_err("child older than parent");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);

        let err = services
            .relationships()
            .create_child_and_link(parent.id, PersonFields::new("Kid", "Doe"), "step")
            .expect_err("bad type");
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        assert_eq!(f.person_count(), before);
    }

    #[test]
    fn create_parent_and_link_checks_existing_parents() {
        let f = Fixture::new();
        let father = f.person("F", Some((1960, 1, 1)), true);
        let child = f.person("C", Some((1990, 1, 1)), false);
        let services = f.services();
        let rels = services.relationships();
        rels.link_existing_child(father.id, child.id, "biological")
            .expect("link");

        let before = f.person_count();
        let err = rels
            .create_parent_and_link(
                child.id,
                PersonFields::new("Other", "Man").male(true),
                "biological",
            )
            .expect_err("same sex");
        assert_eq!(err.code(), ErrorCode::GenderConflict);
        assert_eq!(f.person_count(), before);

        let linked = rels
            .create_parent_and_link(
                child.id,
                PersonFields::new("Mother", "Doe").born(date(1962, 3, 4)),
                "biological",
            )
            .expect("mother");
        assert_eq!(linked.relationship.child_id, child.id);

        let err = rels
            .create_parent_and_link(child.id, PersonFields::new("Third", "Doe"), "biological")
            .expect_err("full");
        assert_eq!(err.code(), ErrorCode::TooManyParents);
    }

    #[test]
    fn candidate_lists_follow_link_rules() {
        let f = Fixture::new();
        let father = f.person("F", Some((1960, 1, 1)), true);
        let mother = f.person("M", Some((1962, 1, 1)), false);
        let child = f.person("C", Some((1990, 1, 1)), false);
        let services = f.services();
        let rels = services.relationships();

        rels.link_existing_child(father.id, child.id, "biological")
            .expect("link");
        let parents: Vec<i64> = rels
            .available_parents(child.id)
            .expect("candidates")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(parents, vec![mother.id]);

        let children: Vec<i64> = rels
            .available_children(father.id)
            .expect("candidates")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(children, vec![mother.id]);

        let (up, down) = rels.edges_of(child.id).expect("edges");
        assert_eq!(up.len(), 1);
        assert!(down.is_empty());
    }
}

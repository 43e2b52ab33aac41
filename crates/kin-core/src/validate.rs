//! Decision logic for relationship links plus field validation for persons
//! and trees.
//!
//! Nothing in this module touches storage: callers load the records and hand
//! them in, so every rule here is a pure function of its inputs.

use crate::error::{KinError, KinResult};
use crate::model::{Person, PersonFields, RelationshipType};
use chrono::NaiveDate;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TREE_NAME_LEN: usize = 255;

/// The facts about one side of a proposed link that the checks depend on.
///
/// `id` is `None` for a person that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub id: Option<i64>,
    pub tree_id: i64,
    pub birth_date: Option<NaiveDate>,
    pub is_male: bool,
}

impl Endpoint {
    /// Endpoint for a person about to be created in `tree_id`.
    #[must_use]
    pub const fn pending(tree_id: i64, fields: &PersonFields) -> Self {
        Self {
            id: None,
            tree_id,
            birth_date: fields.birth_date,
            is_male: fields.is_male,
        }
    }
}

impl From<&Person> for Endpoint {
    fn from(person: &Person) -> Self {
        Self {
            id: Some(person.id),
            tree_id: person.tree_id,
            birth_date: person.birth_date,
            is_male: person.is_male,
        }
    }
}

/// Everything needed to decide whether `parent -> child` may be created.
#[derive(Debug, Clone, Copy)]
pub struct LinkCheck<'a> {
    pub parent: Endpoint,
    pub child: Endpoint,
    pub relationship_type: &'a str,
    /// Current parents of the child, as stored.
    pub existing_parents: &'a [Person],
    pub edge_exists: bool,
}

/// Run the link checks in order and report the first failure.
///
/// Order: type and self-link, same tree, chronology, parent count and sex,
/// duplicate edge.
pub fn check_link(check: &LinkCheck<'_>) -> KinResult<RelationshipType> {
    let kind = check
        .relationship_type
        .parse::<RelationshipType>()
        .map_err(|err| KinError::validation("relationship_type", err.to_string()))?;

    let parent = check.parent;
    let child = check.child;

    if parent.id.is_some() && parent.id == child.id {
        return Err(KinError::validation(
            "parent_id",
            "a person cannot be their own parent",
        ));
    }

    if parent.tree_id != child.tree_id {
        return Err(KinError::CrossTree {
            parent_tree: parent.tree_id,
            child_tree: child.tree_id,
        });
    }

    if let (Some(parent_born), Some(child_born)) = (parent.birth_date, child.birth_date) {
        if parent_born >= child_born {
            return Err(KinError::Chronology(format!(
                "parent born {parent_born} must be born before child born {child_born}"
            )));
        }
    }

    // The proposed parent never counts against its own slot.
    let others: Vec<&Person> = check
        .existing_parents
        .iter()
        .filter(|existing| Some(existing.id) != parent.id)
        .collect();

    match others.as_slice() {
        [] => {}
        [only] => {
            if only.is_male == parent.is_male {
                return Err(KinError::GenderConflict {
                    existing_parent_id: only.id,
                });
            }
        }
        _ => {
            return Err(KinError::TooManyParents {
                child_id: child.id.unwrap_or_default(),
                count: others.len(),
            });
        }
    }

    if check.edge_exists {
        return Err(KinError::DuplicateRelationship {
            parent_id: parent.id.unwrap_or_default(),
            child_id: child.id.unwrap_or_default(),
        });
    }

    Ok(kind)
}

/// The stored links of a person whose attributes are being edited.
#[derive(Debug, Clone, Copy)]
pub struct RelativesCheck<'a> {
    pub current: &'a Person,
    pub parents: &'a [Person],
    pub children: &'a [Person],
    /// Other parents of `children`; the edited person is not among them.
    pub co_parents: &'a [Person],
}

/// Check that edited attributes keep every stored link of the person valid.
///
/// Only a changed birth date or sex flag is rechecked: the person must stay
/// strictly younger than each dated parent and strictly older than each
/// dated child, and must not share a sex flag with a co-parent.
pub fn check_relatives(check: &RelativesCheck<'_>, fields: &PersonFields) -> KinResult<()> {
    if fields.birth_date != check.current.birth_date {
        if let Some(born) = fields.birth_date {
            let older_parent = check
                .parents
                .iter()
                .find_map(|p| p.birth_date.filter(|d| *d >= born).map(|d| (p.id, d)));
            if let Some((parent_id, parent_born)) = older_parent {
                return Err(KinError::Chronology(format!(
                    "birth date {born} is not after parent {parent_id} born {parent_born}"
                )));
            }

            let younger_child = check
                .children
                .iter()
                .find_map(|c| c.birth_date.filter(|d| *d <= born).map(|d| (c.id, d)));
            if let Some((child_id, child_born)) = younger_child {
                return Err(KinError::Chronology(format!(
                    "birth date {born} is not before child {child_id} born {child_born}"
                )));
            }
        }
    }

    if fields.is_male != check.current.is_male {
        if let Some(other) = check.co_parents.iter().find(|p| p.is_male == fields.is_male) {
            return Err(KinError::GenderConflict {
                existing_parent_id: other.id,
            });
        }
    }

    Ok(())
}

pub fn validate_id(field: &'static str, id: i64) -> KinResult<()> {
    if id <= 0 {
        return Err(KinError::validation(
            field,
            format!("must be a positive id, got {id}"),
        ));
    }
    Ok(())
}

pub fn validate_name(field: &'static str, s: &str) -> KinResult<()> {
    validate_label(field, s, MAX_NAME_LEN)
}

pub fn validate_tree_name(s: &str) -> KinResult<()> {
    validate_label("name", s, MAX_TREE_NAME_LEN)
}

fn validate_label(field: &'static str, s: &str, max_len: usize) -> KinResult<()> {
    if s.trim().is_empty() {
        return Err(KinError::validation(field, "must not be empty"));
    }
    if s.chars().count() > max_len {
        return Err(KinError::validation(
            field,
            format!("must be <= {max_len} characters"),
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(KinError::validation(
            field,
            "must not contain control characters",
        ));
    }
    Ok(())
}

/// Validate person attributes against `today`.
///
/// Expects fields already passed through [`PersonFields::normalized`].
pub fn validate_person_fields(fields: &PersonFields, today: NaiveDate) -> KinResult<()> {
    validate_name("first_name", &fields.first_name)?;
    validate_name("last_name", &fields.last_name)?;

    if let Some(born) = fields.birth_date.filter(|born| *born > today) {
        return Err(KinError::validation(
            "birth_date",
            format!("{born} is in the future"),
        ));
    }

    if let Some(died) = fields.death_date {
        if died > today {
            return Err(KinError::validation(
                "death_date",
                format!("{died} is in the future"),
            ));
        }
        if let Some(born) = fields.birth_date.filter(|born| died < *born) {
            return Err(KinError::Chronology(format!(
                "death date {died} precedes birth date {born}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn person(id: i64, tree_id: i64, born: Option<NaiveDate>, is_male: bool) -> Person {
        let now = Utc::now();
        Person {
            id,
            tree_id,
            first_name: format!("P{id}"),
            last_name: "Test".into(),
            birth_date: born,
            death_date: None,
            is_male,
            biography: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn check<'a>(
        parent: &Person,
        child: &Person,
        kind: &'a str,
        existing: &'a [Person],
        edge_exists: bool,
    ) -> KinResult<RelationshipType> {
        check_link(&LinkCheck {
            parent: parent.into(),
            child: child.into(),
            relationship_type: kind,
            existing_parents: existing,
            edge_exists,
        })
    }

    #[test]
    fn accepts_first_parent() {
        let p = person(1, 1, Some(date(1960, 1, 1)), true);
        let c = person(2, 1, Some(date(1990, 1, 1)), false);
        assert_eq!(
            check(&p, &c, "biological", &[], false).expect("valid"),
            RelationshipType::Biological
        );
    }

    #[test]
    fn rejects_unknown_type_before_anything_else() {
        let p = person(1, 1, Some(date(2000, 1, 1)), true);
        let c = person(2, 2, Some(date(1990, 1, 1)), false);
        let err = check(&p, &c, "Biological", &[], true).expect_err("bad type");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn rejects_self_link() {
        let p = person(1, 1, None, true);
        let err = check(&p, &p, "biological", &[], false).expect_err("self link");
        assert!(matches!(err, KinError::Validation { field: "parent_id", .. }));
    }

    #[test]
    fn cross_tree_wins_over_chronology() {
        let p = person(1, 1, Some(date(2000, 1, 1)), true);
        let c = person(2, 2, Some(date(1990, 1, 1)), false);
        let err = check(&p, &c, "biological", &[], false).expect_err("cross tree");
        assert!(matches!(
            err,
            KinError::CrossTree {
                parent_tree: 1,
                child_tree: 2
            }
        ));
    }

    #[test]
    fn chronology_requires_strictly_earlier_parent() {
        let p = person(1, 1, Some(date(1990, 1, 1)), true);
        let c = person(2, 1, Some(date(1990, 1, 1)), false);
        let err = check(&p, &c, "biological", &[], false).expect_err("same day");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);
    }

    #[test]
    fn missing_dates_skip_chronology() {
        let p = person(1, 1, None, true);
        let c = person(2, 1, Some(date(1990, 1, 1)), false);
        assert!(check(&p, &c, "not_biological", &[], false).is_ok());

        let p = person(1, 1, Some(date(2020, 1, 1)), true);
        let c = person(2, 1, None, false);
        assert!(check(&p, &c, "biological", &[], false).is_ok());
    }

    #[test]
    fn second_parent_must_differ_in_sex() {
        let father = person(1, 1, Some(date(1960, 1, 1)), true);
        let child = person(2, 1, Some(date(1990, 1, 1)), false);
        let other_male = person(3, 1, Some(date(1962, 1, 1)), true);
        let mother = person(4, 1, Some(date(1962, 1, 1)), false);
        let existing = [father.clone()];

        let err = check(&other_male, &child, "biological", &existing, false)
            .expect_err("same sex");
        assert!(matches!(
            err,
            KinError::GenderConflict {
                existing_parent_id: 1
            }
        ));
        assert!(check(&mother, &child, "biological", &existing, false).is_ok());
    }

    #[test]
    fn third_parent_is_rejected() {
        let child = person(2, 1, Some(date(1990, 1, 1)), false);
        let existing = [
            person(1, 1, Some(date(1960, 1, 1)), true),
            person(3, 1, Some(date(1961, 1, 1)), false),
        ];
        let third = person(4, 1, Some(date(1959, 1, 1)), false);
        let err = check(&third, &child, "biological", &existing, false).expect_err("third");
        assert!(matches!(
            err,
            KinError::TooManyParents {
                child_id: 2,
                count: 2
            }
        ));
    }

    #[test]
    fn relinking_existing_parent_reports_duplicate() {
        let father = person(1, 1, Some(date(1960, 1, 1)), true);
        let mother = person(3, 1, Some(date(1961, 1, 1)), false);
        let child = person(2, 1, Some(date(1990, 1, 1)), false);

        let existing = [father.clone()];
        let err = check(&father, &child, "biological", &existing, true).expect_err("dup");
        assert_eq!(err.code(), ErrorCode::DuplicateRelationship);

        let existing = [father.clone(), mother];
        let err = check(&father, &child, "biological", &existing, true).expect_err("dup");
        assert!(matches!(
            err,
            KinError::DuplicateRelationship {
                parent_id: 1,
                child_id: 2
            }
        ));
    }

    #[test]
    fn pending_child_has_no_id() {
        let parent = person(1, 7, Some(date(1960, 1, 1)), true);
        let fields = PersonFields::new("New", "Child").born(date(1950, 1, 1));
        let err = check_link(&LinkCheck {
            parent: (&parent).into(),
            child: Endpoint::pending(7, &fields),
            relationship_type: "biological",
            existing_parents: &[],
            edge_exists: false,
        })
        .expect_err("child born first");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("first_name", "Ada").is_ok());
        assert!(validate_name("first_name", "   ").is_err());
        assert!(validate_name("first_name", &"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name("first_name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("last_name", "Love\nlace").is_err());
        assert!(validate_tree_name(&"t".repeat(MAX_TREE_NAME_LEN)).is_ok());
        assert!(validate_tree_name(&"t".repeat(MAX_TREE_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(validate_id("person_id", 1).is_ok());
        assert!(validate_id("person_id", 0).is_err());
        assert!(validate_id("person_id", -4).is_err());
    }

    #[test]
    fn person_dates_are_checked_against_today() {
        let today = date(2024, 6, 1);
        let ok = PersonFields::new("Ada", "Lovelace")
            .born(date(1815, 12, 10))
            .died(date(1852, 11, 27));
        assert!(validate_person_fields(&ok, today).is_ok());

        let unborn = PersonFields::new("Ada", "Lovelace").born(date(2024, 6, 2));
        let err = validate_person_fields(&unborn, today).expect_err("future birth");
        assert!(matches!(err, KinError::Validation { field: "birth_date", .. }));

        let reversed = PersonFields::new("Ada", "Lovelace")
            .born(date(1900, 1, 1))
            .died(date(1899, 12, 31));
        let err = validate_person_fields(&reversed, today).expect_err("death first");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);

        let same_day = PersonFields::new("Ada", "Lovelace")
            .born(date(1900, 1, 1))
            .died(date(1900, 1, 1));
        assert!(validate_person_fields(&same_day, today).is_ok());
    }

    fn relatives<'a>(
        current: &'a Person,
        parents: &'a [Person],
        children: &'a [Person],
        co_parents: &'a [Person],
    ) -> RelativesCheck<'a> {
        RelativesCheck {
            current,
            parents,
            children,
            co_parents,
        }
    }

    #[test]
    fn edited_birth_must_stay_between_parents_and_children() {
        let me = person(2, 1, Some(date(1950, 1, 1)), true);
        let parents = [person(1, 1, Some(date(1920, 1, 1)), false)];
        let children = [person(3, 1, Some(date(1975, 1, 1)), true)];
        let check = relatives(&me, &parents, &children, &[]);

        let fields = me.fields().born(date(1976, 1, 1));
        let err = check_relatives(&check, &fields).expect_err("after child");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);

        let fields = me.fields().born(date(1920, 1, 1));
        let err = check_relatives(&check, &fields).expect_err("same day as parent");
        assert_eq!(err.code(), ErrorCode::ChronologyViolation);

        let fields = me.fields().born(date(1940, 1, 1));
        assert!(check_relatives(&check, &fields).is_ok());

        let mut fields = me.fields();
        fields.birth_date = None;
        assert!(check_relatives(&check, &fields).is_ok());
    }

    #[test]
    fn edited_sex_must_differ_from_co_parents() {
        let me = person(2, 1, Some(date(1952, 1, 1)), false);
        let children = [person(3, 1, Some(date(1975, 1, 1)), true)];
        let co_parents = [person(1, 1, Some(date(1950, 1, 1)), true)];
        let check = relatives(&me, &[], &children, &co_parents);

        let err = check_relatives(&check, &me.fields().male(true)).expect_err("flip");
        assert!(matches!(
            err,
            KinError::GenderConflict {
                existing_parent_id: 1
            }
        ));

        // Unchanged attributes are not rechecked.
        assert!(check_relatives(&check, &me.fields().biography("edited")).is_ok());
    }
}

//! Validated operations over the stores.
//!
//! Every service borrows one connection and a [`ServiceContext`]; nothing is
//! cached between calls.

pub mod person;
pub mod relationship;
pub mod tree;

pub use person::PersonService;
pub use relationship::{LinkedPerson, RelationshipService};
pub use tree::TreeService;

use crate::error::{KinError, KinResult};
use crate::model::Person;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

/// Caller identity and clock for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    /// Acting owner; tree ownership is enforced only when this is set.
    pub owner: Option<String>,
    /// Reference date for "not in the future" checks.
    pub today: NaiveDate,
}

impl ServiceContext {
    #[must_use]
    pub fn new(owner: Option<String>) -> Self {
        Self {
            owner,
            today: Utc::now().date_naive(),
        }
    }

    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Entry point handing out the individual services.
pub struct Services<'conn> {
    conn: &'conn Connection,
    ctx: ServiceContext,
}

impl<'conn> Services<'conn> {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection, ctx: ServiceContext) -> Self {
        Self { conn, ctx }
    }

    #[must_use]
    pub const fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    #[must_use]
    pub const fn trees(&self) -> TreeService<'_> {
        TreeService::new(self.conn, &self.ctx)
    }

    #[must_use]
    pub const fn persons(&self) -> PersonService<'_> {
        PersonService::new(self.conn, &self.ctx)
    }

    #[must_use]
    pub const fn relationships(&self) -> RelationshipService<'_> {
        RelationshipService::new(self.conn, &self.ctx)
    }
}

pub(crate) fn load_person(conn: &Connection, person_id: i64) -> KinResult<Person> {
    crate::validate::validate_id("person_id", person_id)?;
    crate::db::person::get_person(conn, person_id)?.ok_or(KinError::PersonNotFound(person_id))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ServiceContext;
    use chrono::NaiveDate;
    use rusqlite::Connection;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    pub fn ctx() -> ServiceContext {
        ServiceContext::new(Some("alice".to_string())).with_today(date(2024, 6, 1))
    }

    pub fn db() -> Connection {
        crate::db::open_in_memory().expect("open in-memory db")
    }
}

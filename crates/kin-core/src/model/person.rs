use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A person record, scoped to exactly one tree for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub tree_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    pub is_male: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The editable attributes of this record.
    #[must_use]
    pub fn fields(&self) -> PersonFields {
        PersonFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date,
            death_date: self.death_date,
            is_male: self.is_male,
            biography: self.biography.clone(),
        }
    }
}

/// Caller-supplied attributes for creating or updating a person.
///
/// `tree_id` is deliberately absent: it is stamped by the service on creation
/// and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub is_male: bool,
    pub biography: Option<String>,
}

impl PersonFields {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn born(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    #[must_use]
    pub const fn died(mut self, date: NaiveDate) -> Self {
        self.death_date = Some(date);
        self
    }

    #[must_use]
    pub const fn male(mut self, is_male: bool) -> Self {
        self.is_male = is_male;
        self
    }

    #[must_use]
    pub fn biography(mut self, text: impl Into<String>) -> Self {
        self.biography = Some(text.into());
        self
    }

    /// Trim names and drop a blank biography.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.biography = self
            .biography
            .map(|bio| bio.trim().to_string())
            .filter(|bio| !bio.is_empty());
        self
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A namespace scoping a disjoint set of persons and their relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub id: i64,
    /// Owner identity, resolved by the caller (CLI flag, env, or config).
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tree {
    /// Returns `true` if `owner` may read and modify this tree.
    #[must_use]
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }
}

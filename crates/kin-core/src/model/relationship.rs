use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Tag carried by every parent→child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Biological,
    NotBiological,
}

impl RelationshipType {
    pub const ALL: [Self; 2] = [Self::Biological, Self::NotBiological];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Biological => "biological",
            Self::NotBiological => "not_biological",
        }
    }
}

impl Default for RelationshipType {
    fn default() -> Self {
        Self::Biological
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a relationship tag is not one of the two accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("relationship type must be 'biological' or 'not_biological', got '{0}'")]
pub struct ParseRelationshipTypeError(pub String);

impl FromStr for RelationshipType {
    type Err = ParseRelationshipTypeError;

    /// Exact match only: no trimming, no case folding, no aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "biological" => Ok(Self::Biological),
            "not_biological" => Ok(Self::NotBiological),
            other => Err(ParseRelationshipTypeError(other.to_string())),
        }
    }
}

/// A directed parent→child edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: i64,
    pub parent_id: i64,
    pub child_id: i64,
    pub relationship_type: RelationshipType,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_exact_spellings() {
        for kind in RelationshipType::ALL {
            assert_eq!(kind.as_str().parse::<RelationshipType>(), Ok(kind));
        }
    }

    #[test]
    fn parse_rejects_near_misses() {
        for raw in ["Biological", " biological", "not-biological", "adoptive", ""] {
            let err = raw.parse::<RelationshipType>().expect_err("must reject");
            assert_eq!(err.0, raw);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&RelationshipType::NotBiological).expect("serialize");
        assert_eq!(json, "\"not_biological\"");
    }
}

use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidInput,
    ChronologyViolation,
    CrossTreeLink,
    TooManyParents,
    GenderConflict,
    DuplicateRelationship,
    PersonNotFound,
    TreeNotFound,
    RelationshipNotFound,
    TreeAccessDenied,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidInput => "E2001",
            Self::ChronologyViolation => "E2002",
            Self::CrossTreeLink => "E2003",
            Self::TooManyParents => "E2004",
            Self::GenderConflict => "E2005",
            Self::DuplicateRelationship => "E2006",
            Self::PersonNotFound => "E3001",
            Self::TreeNotFound => "E3002",
            Self::RelationshipNotFound => "E3003",
            Self::TreeAccessDenied => "E4001",
            Self::StorageFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidInput => "Invalid input",
            Self::ChronologyViolation => "Dates are out of order",
            Self::CrossTreeLink => "Persons belong to different trees",
            Self::TooManyParents => "Child already has two parents",
            Self::GenderConflict => "Parents must differ in sex",
            Self::DuplicateRelationship => "Relationship already exists",
            Self::PersonNotFound => "Person not found",
            Self::TreeNotFound => "Tree not found",
            Self::RelationshipNotFound => "Relationship not found",
            Self::TreeAccessDenied => "Tree belongs to another owner",
            Self::StorageFailure => "Storage failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `kin init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .kin/config.toml and retry."),
            Self::InvalidInput => None,
            Self::ChronologyViolation => {
                Some("A parent must be born before the child; death cannot precede birth.")
            }
            Self::CrossTreeLink => Some("Link only persons that belong to the same tree."),
            Self::TooManyParents => Some("Remove one of the existing parent links first."),
            Self::GenderConflict => {
                Some("The second parent must have the opposite sex flag of the first.")
            }
            Self::DuplicateRelationship => None,
            Self::PersonNotFound | Self::TreeNotFound | Self::RelationshipNotFound => {
                Some("Check the id with `kin person list` or `kin tree list`.")
            }
            Self::TreeAccessDenied => Some("Use --owner or KIN_OWNER to act as the tree's owner."),
            Self::StorageFailure => Some("Retry once. If persistent, check the database file."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every failure a kin operation can report.
///
/// All variants except [`KinError::Storage`] are client-correctable and carry
/// enough context to explain the rejection. `Storage` wraps unexpected
/// database failures and makes no promise about their structure.
#[derive(Debug, thiserror::Error)]
pub enum KinError {
    /// Malformed input: bad relationship type, missing field, value too long.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Birth/death ordering violated.
    #[error("{0}")]
    Chronology(String),

    /// Parent and child belong to different trees.
    #[error("parent belongs to tree {parent_tree} but child belongs to tree {child_tree}")]
    CrossTree { parent_tree: i64, child_tree: i64 },

    /// The child already has its two parent slots filled.
    #[error("person {child_id} already has {count} parents")]
    TooManyParents { child_id: i64, count: usize },

    /// The remaining parent slot must be filled by the opposite sex.
    #[error("parents must differ in sex: person {existing_parent_id} already has the same sex flag")]
    GenderConflict { existing_parent_id: i64 },

    /// The exact (parent, child) edge already exists.
    #[error("relationship {parent_id} -> {child_id} already exists")]
    DuplicateRelationship { parent_id: i64, child_id: i64 },

    #[error("person {0} not found")]
    PersonNotFound(i64),

    #[error("tree {0} not found")]
    TreeNotFound(i64),

    #[error("relationship {parent_id} -> {child_id} not found")]
    RelationshipNotFound { parent_id: i64, child_id: i64 },

    /// The tree exists but is owned by someone else.
    #[error("tree {tree_id} is not owned by '{owner}'")]
    TreeAccessDenied { tree_id: i64, owner: String },

    /// Unexpected storage failure (connectivity, constraint not covered above).
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl KinError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::InvalidInput,
            Self::Chronology(_) => ErrorCode::ChronologyViolation,
            Self::CrossTree { .. } => ErrorCode::CrossTreeLink,
            Self::TooManyParents { .. } => ErrorCode::TooManyParents,
            Self::GenderConflict { .. } => ErrorCode::GenderConflict,
            Self::DuplicateRelationship { .. } => ErrorCode::DuplicateRelationship,
            Self::PersonNotFound(_) => ErrorCode::PersonNotFound,
            Self::TreeNotFound(_) => ErrorCode::TreeNotFound,
            Self::RelationshipNotFound { .. } => ErrorCode::RelationshipNotFound,
            Self::TreeAccessDenied { .. } => ErrorCode::TreeAccessDenied,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Returns `true` for the kinds a caller can fix by changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// Remediation text for terminal and JSON error output.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.code()
            .hint()
            .map_or_else(|| self.code().message().to_string(), str::to_string)
    }
}

pub type KinResult<T> = std::result::Result<T, KinError>;

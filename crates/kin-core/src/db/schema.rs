//! Canonical SQLite schema for kin.
//!
//! - `trees` is the ownership root; deleting a tree cascades to `persons`
//! - `persons` are scoped to one tree for their whole lifetime
//! - `relationships` holds directed parent→child edges, cascading from both
//!   endpoints
//! - `kin_meta` records the applied schema version

/// Migration v1: core tables plus metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS trees (
    tree_id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL CHECK (length(trim(owner)) > 0),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0 AND length(name) <= 255),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    person_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tree_id INTEGER NOT NULL REFERENCES trees(tree_id) ON DELETE CASCADE,
    first_name TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
    last_name TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
    birth_date TEXT,
    death_date TEXT,
    is_male INTEGER NOT NULL CHECK (is_male IN (0, 1)),
    biography TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (death_date IS NULL OR birth_date IS NULL OR death_date >= birth_date)
);

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    child_id INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    relationship_type TEXT NOT NULL
        CHECK (relationship_type IN ('biological', 'not_biological')),
    created_at TEXT NOT NULL,
    UNIQUE (parent_id, child_id),
    CHECK (parent_id <> child_id)
);

CREATE TABLE IF NOT EXISTS kin_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO kin_meta (id, schema_version) VALUES (1, 1);
"#;

/// Migration v2: read-path indexes for tree listings, candidate queries and
/// graph assembly.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_persons_tree_birth
    ON persons(tree_id, birth_date);

CREATE INDEX IF NOT EXISTS idx_relationships_child
    ON relationships(child_id, parent_id);

CREATE INDEX IF NOT EXISTS idx_trees_owner_created
    ON trees(owner, created_at DESC);
"#;

/// Indexes expected after all migrations.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_persons_tree_birth",
    "idx_relationships_child",
    "idx_trees_owner_created",
];

//! Persisted record types: trees, persons, and parent→child relationships.

pub mod person;
pub mod relationship;
pub mod tree;

pub use person::{Person, PersonFields};
pub use relationship::{ParseRelationshipTypeError, Relationship, RelationshipType};
pub use tree::Tree;

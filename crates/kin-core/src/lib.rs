//! kin-core library.
//!
//! Persistence, validation and graph assembly for genealogical trees.
//!
//! # Conventions
//!
//! - **Errors**: store functions return `anyhow::Result`; everything a caller
//!   can act on is surfaced as [`error::KinError`].
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{ErrorCode, KinError, KinResult};
pub use model::{Person, PersonFields, Relationship, RelationshipType, Tree};
pub use service::{ServiceContext, Services};

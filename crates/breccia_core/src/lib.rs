//! Core domain logic for Breccia.
//! People, their versioned survey answers, and who may see them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod service;
pub mod web;

pub use config::{init_settings, settings, ConfigError, DatabaseLocation, ExportedSettings, Settings};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status};
pub use model::answer_set::{AnswerSet, AnswerSetInput, AnswerSetOwner};
pub use model::person::{Person, PersonId, User, UserId};
pub use model::relationship::{Relationship, RelationshipState};
pub use permission::{access_level, can_edit, AccessLevel};
pub use repo::{RepoError, RepoResult};
pub use web::{Mapper, Request, Response, ViewError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

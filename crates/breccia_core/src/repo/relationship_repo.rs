//! Relationship repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one relationship exists per ordered `(source, target)` pair.
//! - A person never has a relationship with themselves.

use super::{RepoError, RepoResult};
use crate::model::person::PersonId;
use crate::model::relationship::Relationship;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const RELATIONSHIP_SELECT_SQL: &str =
    "SELECT id, source_id, target_id, created_at FROM relationships";

pub trait RelationshipRepository {
    fn create_relationship(
        &self,
        source_id: PersonId,
        target_id: PersonId,
        now: DateTime<Utc>,
    ) -> RepoResult<Relationship>;
    /// The directed relationship from `source_id` to `target_id`, if any.
    fn find_relationship(
        &self,
        source_id: PersonId,
        target_id: PersonId,
    ) -> RepoResult<Option<Relationship>>;
    /// Target ids of every relationship starting at `source_id`.
    fn target_ids(&self, source_id: PersonId) -> RepoResult<BTreeSet<PersonId>>;
}

pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RelationshipRepository for SqliteRelationshipRepository<'_> {
    fn create_relationship(
        &self,
        source_id: PersonId,
        target_id: PersonId,
        now: DateTime<Utc>,
    ) -> RepoResult<Relationship> {
        Relationship::validate_endpoints(source_id, target_id)?;
        for id in [source_id, target_id] {
            if !person_exists(self.conn, id)? {
                return Err(RepoError::NotFound {
                    entity: "person",
                    id,
                });
            }
        }
        if self.find_relationship(source_id, target_id)?.is_some() {
            return Err(RepoError::Conflict(format!(
                "relationship from {source_id} to {target_id} already exists"
            )));
        }

        self.conn.execute(
            "INSERT INTO relationships (source_id, target_id, created_at) VALUES (?1, ?2, ?3);",
            params![source_id, target_id, now],
        )?;

        Ok(Relationship {
            id: self.conn.last_insert_rowid(),
            source_id,
            target_id,
            created_at: now,
        })
    }

    fn find_relationship(
        &self,
        source_id: PersonId,
        target_id: PersonId,
    ) -> RepoResult<Option<Relationship>> {
        let relationship = self
            .conn
            .query_row(
                &format!("{RELATIONSHIP_SELECT_SQL} WHERE source_id = ?1 AND target_id = ?2;"),
                params![source_id, target_id],
                parse_relationship_row,
            )
            .optional()?;
        Ok(relationship)
    }

    fn target_ids(&self, source_id: PersonId) -> RepoResult<BTreeSet<PersonId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT target_id FROM relationships WHERE source_id = ?1;")?;
        let ids = stmt
            .query_map([source_id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<PersonId>>>()?;
        Ok(ids)
    }
}

fn parse_relationship_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get("id")?,
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        created_at: row.get("created_at")?,
    })
}

fn person_exists(conn: &Connection, id: PersonId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM persons WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

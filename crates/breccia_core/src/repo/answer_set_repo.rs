//! Answer-set repository and versioned replacement.
//!
//! # Responsibility
//! - Read the current, latest and historical answer sets of an owner.
//! - Replace the current answer set of an owner in one transaction.
//!
//! # Invariants
//! - `replace_current` takes the SQLite write lock before reading or writing
//!   (`BEGIN IMMEDIATE`), so concurrent replacements for the same owner run
//!   one after the other.
//! - After `replace_current` commits, exactly one answer set of the owner is
//!   current. The partial unique index on `replaced_timestamp IS NULL`
//!   rejects any write that would leave two.
//! - A failed replacement rolls back both the bulk update and the insert.
//! - "Latest" means insertion order (`id`), never the caller-supplied
//!   timestamp.

use super::{RepoError, RepoResult};
use crate::model::answer_set::{AnswerSet, AnswerSetId, AnswerSetInput, AnswerSetOwner};
use crate::model::question::{ChoiceId, QuestionScope};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Outcome of one versioned replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    /// The newly created current answer set.
    pub answer_set: AnswerSet,
    /// Number of previously stored answer sets marked replaced.
    pub replaced: usize,
}

pub trait AnswerSetRepository {
    /// The answer set of `owner` with no replaced timestamp.
    fn current_answer_set(&self, owner: AnswerSetOwner) -> RepoResult<Option<AnswerSet>>;
    /// The most recently inserted answer set of `owner`, current or not.
    fn latest_answer_set(&self, owner: AnswerSetOwner) -> RepoResult<Option<AnswerSet>>;
    /// All answer sets of `owner`, most recently inserted first.
    fn list_answer_sets(&self, owner: AnswerSetOwner) -> RepoResult<Vec<AnswerSet>>;
    /// Creates a new current answer set and marks every other one replaced
    /// as of `now`'s date, atomically.
    fn replace_current(
        &self,
        owner: AnswerSetOwner,
        input: &AnswerSetInput,
        now: DateTime<Utc>,
    ) -> RepoResult<Replacement>;
}

pub struct SqliteAnswerSetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnswerSetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AnswerSetRepository for SqliteAnswerSetRepository<'_> {
    fn current_answer_set(&self, owner: AnswerSetOwner) -> RepoResult<Option<AnswerSet>> {
        fetch_one(
            self.conn,
            owner,
            "AND replaced_timestamp IS NULL ORDER BY id DESC LIMIT 1",
        )
    }

    fn latest_answer_set(&self, owner: AnswerSetOwner) -> RepoResult<Option<AnswerSet>> {
        fetch_one(self.conn, owner, "ORDER BY id DESC LIMIT 1")
    }

    fn list_answer_sets(&self, owner: AnswerSetOwner) -> RepoResult<Vec<AnswerSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY id DESC;",
            select_sql(owner.scope())
        ))?;
        let heads = stmt
            .query_map([owner.id()], |row| read_head(row, owner))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sets = Vec::with_capacity(heads.len());
        for mut set in heads {
            set.choice_ids = load_choice_ids(self.conn, owner.scope(), set.id)?;
            sets.push(set);
        }
        Ok(sets)
    }

    fn replace_current(
        &self,
        owner: AnswerSetOwner,
        input: &AnswerSetInput,
        now: DateTime<Utc>,
    ) -> RepoResult<Replacement> {
        input.validate_location()?;
        let scope = owner.scope();
        let today: NaiveDate = now.date_naive();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !owner_exists(&tx, owner)? {
            return Err(RepoError::NotFound {
                entity: owner_entity(owner),
                id: owner.id(),
            });
        }

        // Vacate the current slot before inserting so the partial unique
        // index never sees two current rows.
        let replaced = tx.execute(
            &format!(
                "UPDATE {} SET replaced_timestamp = ?1 WHERE {} = ?2;",
                scope.answer_sets_table(),
                scope.owner_column()
            ),
            params![today, owner.id()],
        )?;

        let (latitude, longitude) = if scope.has_location() {
            (input.latitude, input.longitude)
        } else {
            (None, None)
        };
        if scope.has_location() {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, timestamp, replaced_timestamp, latitude, longitude)
                     VALUES (?1, ?2, NULL, ?3, ?4);",
                    scope.answer_sets_table(),
                    scope.owner_column()
                ),
                params![owner.id(), now, latitude, longitude],
            )?;
        } else {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, timestamp, replaced_timestamp) VALUES (?1, ?2, NULL);",
                    scope.answer_sets_table(),
                    scope.owner_column()
                ),
                params![owner.id(), now],
            )?;
        }
        let answer_set_id: AnswerSetId = tx.last_insert_rowid();

        let choice_ids = input.choice_ids();
        for choice_id in &choice_ids {
            tx.execute(
                &format!(
                    "INSERT INTO {} (answer_set_id, choice_id) VALUES (?1, ?2);",
                    scope.answer_set_choices_table()
                ),
                params![answer_set_id, choice_id],
            )?;
        }

        tx.commit()?;

        info!(
            "event=answer_set_replace module=repo status=ok owner_kind={} owner_id={} answer_set_id={} replaced={}",
            owner_entity(owner),
            owner.id(),
            answer_set_id,
            replaced
        );

        Ok(Replacement {
            answer_set: AnswerSet {
                id: answer_set_id,
                owner,
                timestamp: now,
                replaced_timestamp: None,
                latitude,
                longitude,
                choice_ids,
            },
            replaced,
        })
    }
}

/// Counts the current answer sets of `owner`; never more than one.
pub fn count_current(conn: &Connection, owner: AnswerSetOwner) -> RepoResult<usize> {
    let scope = owner.scope();
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1 AND replaced_timestamp IS NULL;",
            scope.answer_sets_table(),
            scope.owner_column()
        ),
        [owner.id()],
        |row| row.get(0),
    )?;
    usize::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
}

fn select_sql(scope: QuestionScope) -> String {
    let location = if scope.has_location() {
        "latitude, longitude"
    } else {
        "NULL AS latitude, NULL AS longitude"
    };
    format!(
        "SELECT id, timestamp, replaced_timestamp, {location} FROM {} WHERE {} = ?1",
        scope.answer_sets_table(),
        scope.owner_column()
    )
}

fn fetch_one(
    conn: &Connection,
    owner: AnswerSetOwner,
    tail: &str,
) -> RepoResult<Option<AnswerSet>> {
    let head = conn
        .query_row(
            &format!("{} {tail};", select_sql(owner.scope())),
            [owner.id()],
            |row| read_head(row, owner),
        )
        .optional()?;

    match head {
        Some(mut set) => {
            set.choice_ids = load_choice_ids(conn, owner.scope(), set.id)?;
            Ok(Some(set))
        }
        None => Ok(None),
    }
}

fn read_head(row: &Row<'_>, owner: AnswerSetOwner) -> rusqlite::Result<AnswerSet> {
    Ok(AnswerSet {
        id: row.get("id")?,
        owner,
        timestamp: row.get("timestamp")?,
        replaced_timestamp: row.get("replaced_timestamp")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        choice_ids: Vec::new(),
    })
}

fn load_choice_ids(
    conn: &Connection,
    scope: QuestionScope,
    answer_set_id: AnswerSetId,
) -> RepoResult<Vec<ChoiceId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT choice_id FROM {} WHERE answer_set_id = ?1 ORDER BY choice_id ASC;",
        scope.answer_set_choices_table()
    ))?;
    let ids = stmt
        .query_map([answer_set_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<ChoiceId>>>()?;
    Ok(ids)
}

fn owner_exists(conn: &Connection, owner: AnswerSetOwner) -> RepoResult<bool> {
    let table = match owner {
        AnswerSetOwner::Person(_) => "persons",
        AnswerSetOwner::Relationship(_) => "relationships",
    };
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [owner.id()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn owner_entity(owner: AnswerSetOwner) -> &'static str {
    match owner {
        AnswerSetOwner::Person(_) => "person",
        AnswerSetOwner::Relationship(_) => "relationship",
    }
}

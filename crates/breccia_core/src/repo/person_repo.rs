//! Person repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A user is linked to at most one person; the UNIQUE index on
//!   `persons.user_id` decides, and a violation surfaces as `Conflict`.
//! - Person lists are ordered by name (case-insensitive), then id.

use super::{is_unique_violation, RepoError, RepoResult};
use crate::model::person::{NewPerson, Person, PersonId, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERSON_SELECT_SQL: &str = "SELECT id, name, user_id FROM persons";

pub trait PersonRepository {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// The person linked to `user_id`, if any.
    fn person_for_user(&self, user_id: UserId) -> RepoResult<Option<Person>>;
    fn list_persons(&self) -> RepoResult<Vec<Person>>;
}

pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        person.validate()?;
        let name = person.name.trim();

        let inserted = self.conn.execute(
            "INSERT INTO persons (name, user_id) VALUES (?1, ?2);",
            params![name, person.user_id],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Conflict(format!(
                    "user {} is already linked to a person",
                    person.user_id.unwrap_or_default()
                )));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Person {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            user_id: person.user_id,
        })
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let person = self
            .conn
            .query_row(
                &format!("{PERSON_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_person_row,
            )
            .optional()?;
        Ok(person)
    }

    fn person_for_user(&self, user_id: UserId) -> RepoResult<Option<Person>> {
        let person = self
            .conn
            .query_row(
                &format!("{PERSON_SELECT_SQL} WHERE user_id = ?1;"),
                [user_id],
                parse_person_row,
            )
            .optional()?;
        Ok(person)
    }

    fn list_persons(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let persons = stmt
            .query_map([], parse_person_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(persons)
    }
}

fn parse_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        user_id: row.get("user_id")?,
    })
}

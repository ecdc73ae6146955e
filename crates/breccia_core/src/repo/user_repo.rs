//! User identity repository.

use super::{bool_to_int, int_to_bool, RepoError, RepoResult};
use crate::model::person::{User, UserId};
use crate::model::validate_name;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait UserRepository {
    fn create_user(&self, username: &str, is_superuser: bool) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str, is_superuser: bool) -> RepoResult<User> {
        let username = username.trim();
        validate_name("username", username)?;
        if self.get_user_by_username(username)?.is_some() {
            return Err(RepoError::Conflict(format!(
                "username `{username}` is already taken"
            )));
        }

        self.conn.execute(
            "INSERT INTO users (username, is_superuser) VALUES (?1, ?2);",
            params![username, bool_to_int(is_superuser)],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            is_superuser,
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, is_superuser FROM users WHERE id = ?1;",
                [id],
                read_user_row,
            )
            .optional()?;
        row.map(into_user).transpose()
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, is_superuser FROM users WHERE username = ?1;",
                [username],
                read_user_row,
            )
            .optional()?;
        row.map(into_user).transpose()
    }
}

fn read_user_row(row: &Row<'_>) -> rusqlite::Result<(UserId, String, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_user((id, username, is_superuser): (UserId, String, i64)) -> RepoResult<User> {
    Ok(User {
        id,
        username,
        is_superuser: int_to_bool("users", "is_superuser", is_superuser)?,
    })
}

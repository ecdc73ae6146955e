//! Question definition repository.
//!
//! # Invariants
//! - Questions are returned ordered by `sort_order`, then text, then id.
//! - Choices are returned ordered by `sort_order`, then id.

use super::{bool_to_int, int_to_bool, RepoResult};
use crate::model::question::{NewQuestion, Question, QuestionChoice, QuestionScope};
use crate::model::validate_name;
use rusqlite::{params, Connection};

/// Filters applied when listing questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Keep hardcoded questions; they are skipped by default.
    pub include_hardcoded: bool,
    /// Keep only questions whose answers are public.
    pub public_only: bool,
}

pub trait QuestionRepository {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<Question>;
    fn list_questions(
        &self,
        scope: QuestionScope,
        filter: QuestionFilter,
    ) -> RepoResult<Vec<Question>>;
}

pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<Question> {
        validate_name("question text", &question.text)?;
        for choice in &question.choices {
            validate_name("choice text", choice)?;
        }

        let scope = question.scope;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO {} (text, sort_order, is_hardcoded, answer_is_public, allow_multiple)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                scope.questions_table()
            ),
            params![
                question.text.trim(),
                question.order,
                bool_to_int(question.is_hardcoded),
                bool_to_int(question.answer_is_public),
                bool_to_int(question.allow_multiple),
            ],
        )?;
        let question_id = tx.last_insert_rowid();

        let mut choices = Vec::with_capacity(question.choices.len());
        for (index, text) in question.choices.iter().enumerate() {
            let order = index as i64;
            tx.execute(
                &format!(
                    "INSERT INTO {} (question_id, text, sort_order) VALUES (?1, ?2, ?3);",
                    scope.choices_table()
                ),
                params![question_id, text.trim(), order],
            )?;
            choices.push(QuestionChoice {
                id: tx.last_insert_rowid(),
                question_id,
                text: text.trim().to_string(),
                order,
            });
        }
        tx.commit()?;

        Ok(Question {
            id: question_id,
            scope,
            text: question.text.trim().to_string(),
            order: question.order,
            is_hardcoded: question.is_hardcoded,
            answer_is_public: question.answer_is_public,
            allow_multiple: question.allow_multiple,
            choices,
        })
    }

    fn list_questions(
        &self,
        scope: QuestionScope,
        filter: QuestionFilter,
    ) -> RepoResult<Vec<Question>> {
        let table = scope.questions_table();
        let mut sql = format!(
            "SELECT id, text, sort_order, is_hardcoded, answer_is_public, allow_multiple
             FROM {table} WHERE 1 = 1"
        );
        if !filter.include_hardcoded {
            sql.push_str(" AND is_hardcoded = 0");
        }
        if filter.public_only {
            sql.push_str(" AND answer_is_public = 1");
        }
        sql.push_str(" ORDER BY sort_order ASC, text ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            let id = row.get("id")?;
            questions.push(Question {
                id,
                scope,
                text: row.get("text")?,
                order: row.get("sort_order")?,
                is_hardcoded: int_to_bool(table, "is_hardcoded", row.get("is_hardcoded")?)?,
                answer_is_public: int_to_bool(
                    table,
                    "answer_is_public",
                    row.get("answer_is_public")?,
                )?,
                allow_multiple: int_to_bool(table, "allow_multiple", row.get("allow_multiple")?)?,
                choices: load_choices(self.conn, scope, id)?,
            });
        }
        Ok(questions)
    }
}

fn load_choices(
    conn: &Connection,
    scope: QuestionScope,
    question_id: i64,
) -> RepoResult<Vec<QuestionChoice>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, question_id, text, sort_order
         FROM {}
         WHERE question_id = ?1
         ORDER BY sort_order ASC, id ASC;",
        scope.choices_table()
    ))?;
    let choices = stmt
        .query_map([question_id], |row| {
            Ok(QuestionChoice {
                id: row.get("id")?,
                question_id: row.get("question_id")?,
                text: row.get("text")?,
                order: row.get("sort_order")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(choices)
}

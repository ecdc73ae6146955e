//! Profile visibility resolver.
//!
//! # Responsibility
//! - Resolve which person a profile request targets.
//! - Choose the template variant and the visible subset of dynamic answers.
//!
//! # Invariants
//! - Hardcoded questions never appear in `question_answers`.
//! - A viewer without full access never receives a non-public answer.
//! - A missing answer set yields an empty answer list, never an error.
//! - A self-view with no current answer set resolves to a redirect to the
//!   update flow; every other viewer gets the page.

use super::map::{map_marker, MapMarker};
use crate::model::answer_set::{AnswerSet, AnswerSetOwner};
use crate::model::person::{Person, PersonId, User};
use crate::model::question::{Question, QuestionScope};
use crate::permission::{access_level, is_self_view, AccessLevel};
use crate::repo::answer_set_repo::AnswerSetRepository;
use crate::repo::person_repo::PersonRepository;
use crate::repo::question_repo::QuestionRepository;
use crate::repo::RepoResult;
use log::debug;
use serde::Serialize;

/// One row of the dynamic answer map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionAnswer {
    pub question: String,
    /// Choice texts joined with `", "`.
    pub answer: String,
}

/// Everything a profile page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePage {
    pub person: Person,
    pub access: AccessLevel,
    pub template: &'static str,
    pub answer_set: Option<AnswerSet>,
    pub question_answers: Vec<QuestionAnswer>,
    pub map_markers: Vec<MapMarker>,
}

/// Result of resolving a profile request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutcome {
    /// No target could be resolved; send the viewer somewhere safe.
    NotFound,
    /// The viewer's own profile has no current answers yet.
    RedirectToUpdate(Person),
    Show(Box<ProfilePage>),
}

pub struct ProfileService<P, Q, A>
where
    P: PersonRepository,
    Q: QuestionRepository,
    A: AnswerSetRepository,
{
    persons: P,
    questions: Q,
    answer_sets: A,
}

impl<P, Q, A> ProfileService<P, Q, A>
where
    P: PersonRepository,
    Q: QuestionRepository,
    A: AnswerSetRepository,
{
    pub fn new(persons: P, questions: Q, answer_sets: A) -> Self {
        Self {
            persons,
            questions,
            answer_sets,
        }
    }

    /// Finds the target person: `pk` when given, else the viewer's own.
    pub fn resolve_target(&self, viewer: &User, pk: Option<PersonId>) -> RepoResult<Option<Person>> {
        match pk {
            Some(id) => self.persons.get_person(id),
            None => self.persons.person_for_user(viewer.id),
        }
    }

    pub fn resolve_profile(&self, viewer: &User, pk: Option<PersonId>) -> RepoResult<ProfileOutcome> {
        let Some(person) = self.resolve_target(viewer, pk)? else {
            debug!(
                "event=profile_resolve module=service status=not_found viewer_id={} pk={:?}",
                viewer.id, pk
            );
            return Ok(ProfileOutcome::NotFound);
        };

        let answer_set = self
            .answer_sets
            .current_answer_set(AnswerSetOwner::Person(person.id))?;
        if answer_set.is_none() && is_self_view(viewer, &person) {
            return Ok(ProfileOutcome::RedirectToUpdate(person));
        }

        let access = access_level(viewer, &person);
        let questions = self
            .questions
            .list_questions(QuestionScope::Person, access.question_filter())?;
        let question_answers = build_question_answers(&questions, answer_set.as_ref(), access);
        let map_markers = vec![map_marker(&person, answer_set.as_ref())];

        Ok(ProfileOutcome::Show(Box::new(ProfilePage {
            template: access.detail_template(),
            person,
            access,
            answer_set,
            question_answers,
            map_markers,
        })))
    }
}

/// Collects answers to dynamic questions, joining choice texts with commas.
///
/// Applies the hardcoded and visibility rules itself, whatever filter
/// produced `questions`.
pub fn build_question_answers(
    questions: &[Question],
    answer_set: Option<&AnswerSet>,
    access: AccessLevel,
) -> Vec<QuestionAnswer> {
    let Some(answer_set) = answer_set else {
        return Vec::new();
    };

    questions
        .iter()
        .filter(|question| !question.is_hardcoded)
        .filter(|question| access == AccessLevel::Full || question.answer_is_public)
        .map(|question| QuestionAnswer {
            question: question.text.clone(),
            answer: question
                .choices
                .iter()
                .filter(|choice| answer_set.choice_ids.contains(&choice.id))
                .map(|choice| choice.text.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::build_question_answers;
    use crate::model::answer_set::{AnswerSet, AnswerSetOwner};
    use crate::model::question::{Question, QuestionChoice, QuestionScope};
    use crate::permission::AccessLevel;
    use chrono::Utc;

    fn question(id: i64, text: &str, is_public: bool, is_hardcoded: bool) -> Question {
        Question {
            id,
            scope: QuestionScope::Person,
            text: text.to_string(),
            order: id,
            is_hardcoded,
            answer_is_public: is_public,
            allow_multiple: true,
            choices: vec![
                QuestionChoice {
                    id: id * 10 + 1,
                    question_id: id,
                    text: format!("{text} one"),
                    order: 0,
                },
                QuestionChoice {
                    id: id * 10 + 2,
                    question_id: id,
                    text: format!("{text} two"),
                    order: 1,
                },
            ],
        }
    }

    fn answer_set(choice_ids: Vec<i64>) -> AnswerSet {
        AnswerSet {
            id: 1,
            owner: AnswerSetOwner::Person(1),
            timestamp: Utc::now(),
            replaced_timestamp: None,
            latitude: None,
            longitude: None,
            choice_ids,
        }
    }

    #[test]
    fn missing_answer_set_gives_empty_answers() {
        let questions = vec![question(1, "Role", true, false)];
        assert!(build_question_answers(&questions, None, AccessLevel::Full).is_empty());
    }

    #[test]
    fn answers_are_joined_and_hardcoded_questions_skipped() {
        let questions = vec![
            question(1, "Role", true, false),
            question(2, "Nationality", true, true),
        ];
        let set = answer_set(vec![11, 12, 21]);
        let answers = build_question_answers(&questions, Some(&set), AccessLevel::Full);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].question, "Role");
        assert_eq!(answers[0].answer, "Role one, Role two");
    }

    #[test]
    fn partial_access_never_sees_private_answers() {
        let questions = vec![
            question(1, "Role", true, false),
            question(2, "Salary", false, false),
        ];
        let set = answer_set(vec![11, 21]);

        let partial = build_question_answers(&questions, Some(&set), AccessLevel::Partial);
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].question, "Role");

        let full = build_question_answers(&questions, Some(&set), AccessLevel::Full);
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn unanswered_question_has_empty_answer_text() {
        let questions = vec![question(1, "Role", true, false)];
        let set = answer_set(Vec::new());
        let answers = build_question_answers(&questions, Some(&set), AccessLevel::Partial);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "");
    }
}

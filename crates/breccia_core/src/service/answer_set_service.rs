//! Answer-set update use-cases.
//!
//! # Responsibility
//! - Validate submitted answers against the question set of their scope.
//! - Run the versioned replacement for people and relationships.
//! - Project the current answer set into initial form data.
//!
//! # Invariants
//! - Nothing is written unless every submitted answer is valid.
//! - Replacement is delegated to `AnswerSetRepository::replace_current`,
//!   which is a single transaction.

use super::FieldError;
use crate::model::answer_set::{AnswerSet, AnswerSetInput, AnswerSetOwner};
use crate::model::person::PersonId;
use crate::model::question::{ChoiceId, Question, QuestionId, QuestionScope};
use crate::model::relationship::RelationshipId;
use crate::model::ValidationError;
use crate::repo::answer_set_repo::{AnswerSetRepository, Replacement};
use crate::repo::question_repo::{QuestionFilter, QuestionRepository};
use crate::repo::RepoError;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for answer-set updates.
#[derive(Debug)]
pub enum AnswerSetServiceError {
    /// The submission failed validation; nothing was written.
    Invalid(Vec<FieldError>),
    Repo(RepoError),
}

impl Display for AnswerSetServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "{} invalid answer field(s)", errors.len()),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AnswerSetServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<RepoError> for AnswerSetServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Initial values for an update form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitialAnswers {
    pub person_id: Option<PersonId>,
    /// Previously selected choice ids, keyed by question id.
    pub answers: BTreeMap<QuestionId, Vec<ChoiceId>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl InitialAnswers {
    /// Initial data echoing a submission, for re-rendering a rejected form.
    pub fn from_submission(person_id: PersonId, input: &AnswerSetInput) -> Self {
        Self {
            person_id: Some(person_id),
            answers: input.answers.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

pub struct AnswerSetService<Q: QuestionRepository, A: AnswerSetRepository> {
    questions: Q,
    answer_sets: A,
}

impl<Q: QuestionRepository, A: AnswerSetRepository> AnswerSetService<Q, A> {
    pub fn new(questions: Q, answer_sets: A) -> Self {
        Self {
            questions,
            answer_sets,
        }
    }

    /// Records a new current answer set for a person.
    pub fn update_person_answers(
        &self,
        person_id: PersonId,
        input: &AnswerSetInput,
    ) -> Result<Replacement, AnswerSetServiceError> {
        self.replace(AnswerSetOwner::Person(person_id), input)
    }

    /// Records a new current answer set for a relationship.
    pub fn update_relationship_answers(
        &self,
        relationship_id: RelationshipId,
        input: &AnswerSetInput,
    ) -> Result<Replacement, AnswerSetServiceError> {
        self.replace(AnswerSetOwner::Relationship(relationship_id), input)
    }

    pub fn current_answers(&self, owner: AnswerSetOwner) -> Result<Option<AnswerSet>, RepoError> {
        self.answer_sets.current_answer_set(owner)
    }

    /// Initial form data for a person: their current answers plus
    /// `person_id`, or just `person_id` when nothing was answered yet.
    pub fn initial_for_person(&self, person_id: PersonId) -> Result<InitialAnswers, RepoError> {
        let owner = AnswerSetOwner::Person(person_id);
        let mut initial = match self.answer_sets.current_answer_set(owner)? {
            Some(set) => {
                let questions = self.all_questions(owner.scope())?;
                answers_as_initial(&set, &questions)
            }
            None => InitialAnswers::default(),
        };
        initial.person_id = Some(person_id);
        Ok(initial)
    }

    /// Every question of `scope`, hardcoded ones included.
    pub fn all_questions(&self, scope: QuestionScope) -> Result<Vec<Question>, RepoError> {
        self.questions.list_questions(
            scope,
            QuestionFilter {
                include_hardcoded: true,
                public_only: false,
            },
        )
    }

    fn replace(
        &self,
        owner: AnswerSetOwner,
        input: &AnswerSetInput,
    ) -> Result<Replacement, AnswerSetServiceError> {
        let questions = self.all_questions(owner.scope())?;
        let errors = validate_answers(&questions, input);
        if !errors.is_empty() {
            return Err(AnswerSetServiceError::Invalid(errors));
        }

        let replacement = self
            .answer_sets
            .replace_current(owner, input, Utc::now())?;
        Ok(replacement)
    }
}

/// Checks submitted answers against `questions`.
///
/// Returns one error per offending field; empty means valid.
pub fn validate_answers(questions: &[Question], input: &AnswerSetInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (question_id, choice_ids) in &input.answers {
        let field = format!("question_{question_id}");
        let Some(question) = questions.iter().find(|question| question.id == *question_id) else {
            errors.push(FieldError::new(field, "unknown question"));
            continue;
        };

        if let Some(bad) = choice_ids.iter().find(|id| question.choice(**id).is_none()) {
            errors.push(FieldError::new(
                field,
                format!("choice {bad} is not an option for this question"),
            ));
            continue;
        }

        if !question.allow_multiple && choice_ids.len() > 1 {
            errors.push(FieldError::new(field, "only one choice may be selected"));
        }
    }

    if let Err(err) = input.validate_location() {
        let field = match err {
            ValidationError::CoordinateOutOfRange { field, .. } => field,
            _ => "location",
        };
        errors.push(FieldError::new(field, err.to_string()));
    }

    errors
}

fn answers_as_initial(set: &AnswerSet, questions: &[Question]) -> InitialAnswers {
    let mut answers: BTreeMap<QuestionId, Vec<ChoiceId>> = BTreeMap::new();
    for question in questions {
        let selected: Vec<ChoiceId> = question
            .choices
            .iter()
            .filter(|choice| set.choice_ids.contains(&choice.id))
            .map(|choice| choice.id)
            .collect();
        if !selected.is_empty() {
            answers.insert(question.id, selected);
        }
    }

    InitialAnswers {
        person_id: None,
        answers,
        latitude: set.latitude,
        longitude: set.longitude,
    }
}

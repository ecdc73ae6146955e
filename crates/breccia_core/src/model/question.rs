//! Dynamic survey questions and their choices.
//!
//! # Invariants
//! - Hardcoded questions never appear in the dynamic answer map.
//! - A choice belongs to exactly one question of one scope.

use serde::{Deserialize, Serialize};

pub type QuestionId = i64;
pub type ChoiceId = i64;

/// Which kind of owner a question set is answered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionScope {
    Person,
    Relationship,
}

impl QuestionScope {
    pub(crate) fn questions_table(self) -> &'static str {
        match self {
            Self::Person => "person_questions",
            Self::Relationship => "relationship_questions",
        }
    }

    pub(crate) fn choices_table(self) -> &'static str {
        match self {
            Self::Person => "person_question_choices",
            Self::Relationship => "relationship_question_choices",
        }
    }

    pub(crate) fn answer_sets_table(self) -> &'static str {
        match self {
            Self::Person => "person_answer_sets",
            Self::Relationship => "relationship_answer_sets",
        }
    }

    pub(crate) fn answer_set_choices_table(self) -> &'static str {
        match self {
            Self::Person => "person_answer_set_choices",
            Self::Relationship => "relationship_answer_set_choices",
        }
    }

    pub(crate) fn owner_column(self) -> &'static str {
        match self {
            Self::Person => "person_id",
            Self::Relationship => "relationship_id",
        }
    }

    /// Only person answer sets carry a location.
    pub(crate) fn has_location(self) -> bool {
        matches!(self, Self::Person)
    }
}

/// One selectable answer to a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionChoice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub text: String,
    pub order: i64,
}

/// A question definition with its ordered choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub scope: QuestionScope,
    pub text: String,
    pub order: i64,
    /// Rendered separately by presentation, excluded from dynamic answers.
    pub is_hardcoded: bool,
    /// Answers may be shown to viewers without full access.
    pub answer_is_public: bool,
    pub allow_multiple: bool,
    pub choices: Vec<QuestionChoice>,
}

impl Question {
    pub fn choice(&self, id: ChoiceId) -> Option<&QuestionChoice> {
        self.choices.iter().find(|choice| choice.id == id)
    }
}

/// Input for defining a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub scope: QuestionScope,
    pub text: String,
    pub order: i64,
    pub is_hardcoded: bool,
    pub answer_is_public: bool,
    pub allow_multiple: bool,
    /// Choice texts in display order.
    pub choices: Vec<String>,
}

impl NewQuestion {
    pub fn new(scope: QuestionScope, text: impl Into<String>) -> Self {
        Self {
            scope,
            text: text.into(),
            order: 0,
            is_hardcoded: false,
            answer_is_public: false,
            allow_multiple: false,
            choices: Vec::new(),
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn public(mut self) -> Self {
        self.answer_is_public = true;
        self
    }

    pub fn hardcoded(mut self) -> Self {
        self.is_hardcoded = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn ordered(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

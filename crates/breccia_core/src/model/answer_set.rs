//! Versioned answer-set snapshots.
//!
//! # Invariants
//! - An answer set is current iff `replaced_timestamp` is `None`.
//! - At most one answer set per owner is current.
//! - Only person answer sets carry a location.

use super::person::PersonId;
use super::question::{ChoiceId, QuestionId, QuestionScope};
use super::relationship::RelationshipId;
use super::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type AnswerSetId = i64;

/// The record an answer set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AnswerSetOwner {
    Person(PersonId),
    Relationship(RelationshipId),
}

impl AnswerSetOwner {
    pub fn scope(self) -> QuestionScope {
        match self {
            Self::Person(_) => QuestionScope::Person,
            Self::Relationship(_) => QuestionScope::Relationship,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Person(id) | Self::Relationship(id) => id,
        }
    }
}

/// One snapshot of an owner's answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub id: AnswerSetId,
    pub owner: AnswerSetOwner,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Date this snapshot stopped being current.
    pub replaced_timestamp: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Selected choices, ascending by id.
    pub choice_ids: Vec<ChoiceId>,
}

impl AnswerSet {
    pub fn is_current(&self) -> bool {
        self.replaced_timestamp.is_none()
    }
}

/// Answers submitted through an update form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSetInput {
    pub answers: BTreeMap<QuestionId, Vec<ChoiceId>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AnswerSetInput {
    /// Range-checks the location fields.
    pub fn validate_location(&self) -> Result<(), ValidationError> {
        if let Some(value) = self.latitude {
            if !(-90.0..=90.0).contains(&value) {
                return Err(ValidationError::CoordinateOutOfRange {
                    field: "latitude",
                    value,
                });
            }
        }
        if let Some(value) = self.longitude {
            if !(-180.0..=180.0).contains(&value) {
                return Err(ValidationError::CoordinateOutOfRange {
                    field: "longitude",
                    value,
                });
            }
        }
        Ok(())
    }

    /// All selected choice ids, deduplicated and sorted.
    pub fn choice_ids(&self) -> Vec<ChoiceId> {
        let mut ids: Vec<ChoiceId> = self.answers.values().flatten().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

//! Directed relationships between people.

use super::person::PersonId;
use super::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RelationshipId = i64;

/// A directed edge from `source_id` to `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source_id: PersonId,
    pub target_id: PersonId,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn validate_endpoints(source_id: PersonId, target_id: PersonId) -> Result<(), ValidationError> {
        if source_id == target_id {
            return Err(ValidationError::SelfRelationship);
        }
        Ok(())
    }
}

/// Result of looking up the relationship between an ordered pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipState {
    /// No relationship from source to target exists.
    None,
    /// The latest answer set has no replaced timestamp.
    Current(Relationship),
    /// The relationship exists but its latest answer set was replaced, or it
    /// has never been answered.
    NotCurrent(Relationship),
}

impl RelationshipState {
    pub fn relationship(&self) -> Option<&Relationship> {
        match self {
            Self::None => None,
            Self::Current(relationship) | Self::NotCurrent(relationship) => Some(relationship),
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current(_))
    }
}

//! Relationship create and current-state lookup.
//!
//! # Invariants
//! - A disjoint pair resolves to `RelationshipState::None`, never an error.
//! - `Current` iff the relationship has an answer set that is not replaced.

use crate::model::answer_set::AnswerSetOwner;
use crate::model::person::PersonId;
use crate::model::relationship::{Relationship, RelationshipState};
use crate::repo::answer_set_repo::AnswerSetRepository;
use crate::repo::relationship_repo::RelationshipRepository;
use crate::repo::RepoResult;
use chrono::Utc;
use log::info;

pub struct RelationshipService<R: RelationshipRepository, A: AnswerSetRepository> {
    relationships: R,
    answer_sets: A,
}

impl<R: RelationshipRepository, A: AnswerSetRepository> RelationshipService<R, A> {
    pub fn new(relationships: R, answer_sets: A) -> Self {
        Self {
            relationships,
            answer_sets,
        }
    }

    pub fn create_relationship(
        &self,
        source_id: PersonId,
        target_id: PersonId,
    ) -> RepoResult<Relationship> {
        let relationship = self
            .relationships
            .create_relationship(source_id, target_id, Utc::now())?;
        info!(
            "event=relationship_create module=service status=ok relationship_id={}",
            relationship.id
        );
        Ok(relationship)
    }

    /// Looks up the directed relationship from `source_id` to `target_id`.
    pub fn relationship_state(
        &self,
        source_id: PersonId,
        target_id: PersonId,
    ) -> RepoResult<RelationshipState> {
        let Some(relationship) = self.relationships.find_relationship(source_id, target_id)? else {
            return Ok(RelationshipState::None);
        };

        let current = self
            .answer_sets
            .current_answer_set(AnswerSetOwner::Relationship(relationship.id))?;
        match current {
            Some(_) => Ok(RelationshipState::Current(relationship)),
            None => Ok(RelationshipState::NotCurrent(relationship)),
        }
    }
}

//! Person list and create use-cases.

use super::FieldError;
use crate::model::person::{NewPerson, Person, PersonId, User};
use crate::model::ValidationError;
use crate::repo::person_repo::PersonRepository;
use crate::repo::relationship_repo::RelationshipRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;

/// Person list with the viewer's outgoing relationship targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonListing {
    pub persons: Vec<Person>,
    /// Empty when the viewer has no linked person.
    pub existing_relationships: BTreeSet<PersonId>,
}

pub struct PersonService<P: PersonRepository, R: RelationshipRepository> {
    persons: P,
    relationships: R,
}

impl<P: PersonRepository, R: RelationshipRepository> PersonService<P, R> {
    pub fn new(persons: P, relationships: R) -> Self {
        Self {
            persons,
            relationships,
        }
    }

    pub fn list_for_viewer(&self, viewer: &User) -> RepoResult<PersonListing> {
        let persons = self.persons.list_persons()?;
        let existing_relationships = match self.persons.person_for_user(viewer.id)? {
            Some(own) => self.relationships.target_ids(own.id)?,
            None => BTreeSet::new(),
        };
        Ok(PersonListing {
            persons,
            existing_relationships,
        })
    }

    /// Creates a person, linked to `viewer` when `link_to_viewer` is set.
    ///
    /// Validation and linking conflicts come back as field errors.
    pub fn create_person(
        &self,
        viewer: &User,
        name: &str,
        link_to_viewer: bool,
    ) -> RepoResult<Result<Person, Vec<FieldError>>> {
        let new_person = NewPerson {
            name: name.trim().to_string(),
            user_id: link_to_viewer.then_some(viewer.id),
        };

        match self.persons.create_person(&new_person) {
            Ok(person) => {
                info!(
                    "event=person_create module=service status=ok person_id={} linked={}",
                    person.id, link_to_viewer
                );
                Ok(Ok(person))
            }
            Err(RepoError::Validation(err)) => Ok(Err(vec![name_error(&err)])),
            Err(RepoError::Conflict(message)) => Ok(Err(vec![FieldError::new("user", message)])),
            Err(other) => Err(other),
        }
    }

    pub fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.persons.get_person(id)
    }
}

fn name_error(err: &ValidationError) -> FieldError {
    FieldError::new("name", err.to_string())
}

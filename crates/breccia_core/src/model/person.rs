//! Authenticated identities and person profiles.

use super::{validate_name, ValidationError};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PersonId = i64;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Elevated privilege overriding ownership checks.
    pub is_superuser: bool,
}

/// A profile in the relationship graph, optionally linked 1:1 to a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub user_id: Option<UserId>,
}

impl Person {
    /// Canonical profile url for this person.
    pub fn profile_url(&self) -> String {
        format!("/people/{}/profile", self.id)
    }

    pub fn update_url(&self) -> String {
        format!("/people/{}/update", self.id)
    }

    /// Whether `user` is the identity linked to this person.
    pub fn is_linked_to(&self, user: &User) -> bool {
        self.user_id == Some(user.id)
    }
}

/// Input for creating a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub user_id: Option<UserId>,
}

impl NewPerson {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("name", &self.name)
    }
}

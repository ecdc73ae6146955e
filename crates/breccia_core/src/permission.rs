//! Capability checks over a viewer and a target person.
//!
//! Every check is a pure function of its arguments so authorization can be
//! tested without storage.

use crate::model::person::{Person, User};
use crate::repo::question_repo::QuestionFilter;
use serde::Serialize;

pub const DETAIL_FULL_TEMPLATE: &str = "people/person/detail_full.html";
pub const DETAIL_PARTIAL_TEMPLATE: &str = "people/person/detail_partial.html";

/// How much of a profile a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Owner or elevated viewer: every dynamic answer.
    Full,
    /// Anyone else: public answers only.
    Partial,
}

impl AccessLevel {
    pub fn detail_template(self) -> &'static str {
        match self {
            Self::Full => DETAIL_FULL_TEMPLATE,
            Self::Partial => DETAIL_PARTIAL_TEMPLATE,
        }
    }

    /// Question filter for the dynamic answer map at this level.
    pub fn question_filter(self) -> QuestionFilter {
        QuestionFilter {
            include_hardcoded: false,
            public_only: self == Self::Partial,
        }
    }
}

/// Whether `viewer` is looking at their own profile.
pub fn is_self_view(viewer: &User, target: &Person) -> bool {
    target.is_linked_to(viewer)
}

pub fn access_level(viewer: &User, target: &Person) -> AccessLevel {
    if is_self_view(viewer, target) || viewer.is_superuser {
        AccessLevel::Full
    } else {
        AccessLevel::Partial
    }
}

/// Whether `viewer` may submit updates for `target`.
pub fn can_edit(viewer: &User, target: &Person) -> bool {
    is_self_view(viewer, target) || viewer.is_superuser
}

#[cfg(test)]
mod tests {
    use super::{access_level, can_edit, is_self_view, AccessLevel};
    use crate::model::person::{Person, User};

    fn user(id: i64, is_superuser: bool) -> User {
        User {
            id,
            username: format!("user{id}"),
            is_superuser,
        }
    }

    fn person(user_id: Option<i64>) -> Person {
        Person {
            id: 10,
            name: "Target".to_string(),
            user_id,
        }
    }

    #[test]
    fn owner_gets_full_access() {
        let viewer = user(1, false);
        let target = person(Some(1));
        assert!(is_self_view(&viewer, &target));
        assert_eq!(access_level(&viewer, &target), AccessLevel::Full);
        assert!(can_edit(&viewer, &target));
    }

    #[test]
    fn superuser_gets_full_access_without_ownership() {
        let viewer = user(2, true);
        let target = person(Some(1));
        assert!(!is_self_view(&viewer, &target));
        assert_eq!(access_level(&viewer, &target), AccessLevel::Full);
        assert!(can_edit(&viewer, &target));
    }

    #[test]
    fn other_viewer_is_downgraded_to_partial() {
        let viewer = user(3, false);
        for target in [person(Some(1)), person(None)] {
            assert_eq!(access_level(&viewer, &target), AccessLevel::Partial);
            assert!(!can_edit(&viewer, &target));
        }
    }

    #[test]
    fn partial_access_filters_to_public_questions() {
        let filter = AccessLevel::Partial.question_filter();
        assert!(filter.public_only);
        assert!(!filter.include_hardcoded);
        assert!(!AccessLevel::Full.question_filter().public_only);
        assert_eq!(
            AccessLevel::Partial.detail_template(),
            "people/person/detail_partial.html"
        );
    }
}

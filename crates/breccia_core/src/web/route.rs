//! Path routing.
//!
//! # Invariants
//! - `Route::resolve(route.path())` returns `route` for every route.
//! - A single trailing slash is ignored; anything else unmatched is `None`.

use crate::model::activity::{ActivityId, ActivitySeriesId};
use crate::model::person::PersonId;
use once_cell::sync::Lazy;
use regex::Regex;

static PERSON_PROFILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/people/(\d+)/profile$").expect("valid profile route regex"));
static PERSON_UPDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/people/(\d+)/update$").expect("valid update route regex"));
static ACTIVITY_SERIES_DETAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/activity-series/(\d+)$").expect("valid activity series route regex")
});
static ACTIVITY_DETAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/activities/(\d+)$").expect("valid activity route regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    PersonList,
    PersonCreate,
    /// `None` targets the viewer's own linked person.
    Profile(Option<PersonId>),
    PersonUpdate(PersonId),
    ActivitySeriesList,
    ActivitySeriesDetail(ActivitySeriesId),
    ActivityList,
    ActivityDetail(ActivityId),
}

impl Route {
    pub fn resolve(path: &str) -> Option<Self> {
        let path = normalize(path);
        match path {
            "/" => return Some(Self::Index),
            "/people" => return Some(Self::PersonList),
            "/people/create" => return Some(Self::PersonCreate),
            "/people/profile" => return Some(Self::Profile(None)),
            "/activity-series" => return Some(Self::ActivitySeriesList),
            "/activities" => return Some(Self::ActivityList),
            _ => {}
        }

        if let Some(pk) = capture_pk(&PERSON_PROFILE_RE, path) {
            return Some(Self::Profile(Some(pk)));
        }
        if let Some(pk) = capture_pk(&PERSON_UPDATE_RE, path) {
            return Some(Self::PersonUpdate(pk));
        }
        if let Some(pk) = capture_pk(&ACTIVITY_SERIES_DETAIL_RE, path) {
            return Some(Self::ActivitySeriesDetail(pk));
        }
        if let Some(pk) = capture_pk(&ACTIVITY_DETAIL_RE, path) {
            return Some(Self::ActivityDetail(pk));
        }
        None
    }

    /// Canonical path for this route.
    pub fn path(self) -> String {
        match self {
            Self::Index => "/".to_string(),
            Self::PersonList => "/people".to_string(),
            Self::PersonCreate => "/people/create".to_string(),
            Self::Profile(None) => "/people/profile".to_string(),
            Self::Profile(Some(pk)) => format!("/people/{pk}/profile"),
            Self::PersonUpdate(pk) => format!("/people/{pk}/update"),
            Self::ActivitySeriesList => "/activity-series".to_string(),
            Self::ActivitySeriesDetail(pk) => format!("/activity-series/{pk}"),
            Self::ActivityList => "/activities".to_string(),
            Self::ActivityDetail(pk) => format!("/activities/{pk}"),
        }
    }

    /// Stable name used in log events.
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::PersonList => "person.list",
            Self::PersonCreate => "person.create",
            Self::Profile(_) => "person.profile",
            Self::PersonUpdate(_) => "person.update",
            Self::ActivitySeriesList => "activity-series.list",
            Self::ActivitySeriesDetail(_) => "activity-series.detail",
            Self::ActivityList => "activity.list",
            Self::ActivityDetail(_) => "activity.detail",
        }
    }

    /// People routes need an authenticated viewer; activities are public.
    pub fn requires_login(self) -> bool {
        matches!(
            self,
            Self::PersonList | Self::PersonCreate | Self::Profile(_) | Self::PersonUpdate(_)
        )
    }

    /// Whether the route handles form submissions.
    pub fn accepts_post(self) -> bool {
        matches!(self, Self::PersonCreate | Self::PersonUpdate(_))
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn capture_pk(re: &Regex, path: &str) -> Option<i64> {
    re.captures(path)
        .and_then(|caps| caps.get(1))
        .and_then(|pk| pk.as_str().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::Route;

    #[test]
    fn every_route_resolves_from_its_own_path() {
        for route in [
            Route::Index,
            Route::PersonList,
            Route::PersonCreate,
            Route::Profile(None),
            Route::Profile(Some(4)),
            Route::PersonUpdate(4),
            Route::ActivitySeriesList,
            Route::ActivitySeriesDetail(7),
            Route::ActivityList,
            Route::ActivityDetail(9),
        ] {
            assert_eq!(Route::resolve(&route.path()), Some(route), "{}", route.name());
        }
    }

    #[test]
    fn trailing_slash_and_query_are_ignored() {
        assert_eq!(Route::resolve("/people/3/profile/"), Some(Route::Profile(Some(3))));
        assert_eq!(Route::resolve("/people/create?user"), Some(Route::PersonCreate));
    }

    #[test]
    fn unknown_or_malformed_paths_do_not_resolve() {
        assert_eq!(Route::resolve("/people/abc/profile"), None);
        assert_eq!(Route::resolve("/people/99999999999999999999/update"), None);
        assert_eq!(Route::resolve("/admin"), None);
    }

    #[test]
    fn only_people_routes_require_login() {
        assert!(Route::Profile(None).requires_login());
        assert!(Route::PersonUpdate(1).requires_login());
        assert!(!Route::ActivityList.requires_login());
        assert!(!Route::Index.requires_login());
    }
}

//! View responses and typed page contexts.

use crate::config::ExportedSettings;
use crate::model::activity::{Activity, ActivitySeries};
use crate::model::person::{Person, PersonId};
use crate::service::answer_set_service::InitialAnswers;
use crate::service::map::MapMarker;
use crate::service::profile_service::ProfilePage;
use crate::service::FieldError;
use serde::Serialize;
use std::collections::BTreeSet;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const PERSON_LIST_TEMPLATE: &str = "people/person/list.html";
pub const PERSON_CREATE_TEMPLATE: &str = "people/person/create.html";
pub const PERSON_UPDATE_TEMPLATE: &str = "people/person/update.html";
pub const ACTIVITY_SERIES_LIST_TEMPLATE: &str = "activities/activity_series/list.html";
pub const ACTIVITY_SERIES_DETAIL_TEMPLATE: &str = "activities/activity_series/detail.html";
pub const ACTIVITY_LIST_TEMPLATE: &str = "activities/activity/list.html";
pub const ACTIVITY_DETAIL_TEMPLATE: &str = "activities/activity/detail.html";

/// Data handed to a template, one variant per page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageContext {
    Index {},
    PersonList {
        person_list: Vec<Person>,
        existing_relationships: BTreeSet<PersonId>,
    },
    PersonCreate {
        name: String,
        errors: Vec<FieldError>,
    },
    Profile(Box<ProfilePage>),
    PersonUpdate {
        person: Person,
        initial: InitialAnswers,
        errors: Vec<FieldError>,
        map_markers: Vec<MapMarker>,
    },
    ActivitySeriesList {
        activity_series_list: Vec<ActivitySeries>,
    },
    ActivitySeriesDetail {
        activity_series: ActivitySeries,
        activities: Vec<Activity>,
    },
    ActivityList {
        activity_list: Vec<Activity>,
    },
    ActivityDetail {
        activity: Activity,
    },
}

/// A template render request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub context: PageContext,
    pub settings: ExportedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Render(Page),
    Redirect { location: String },
    /// The viewer is authenticated but may not use this route.
    Forbidden,
    NotFound,
    MethodNotAllowed,
}

impl Response {
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }

    pub fn template(&self) -> Option<&'static str> {
        match self {
            Self::Render(page) => Some(page.template),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location } => Some(location),
            _ => None,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Render(_) => 200,
            Self::Redirect { .. } => 302,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }
}

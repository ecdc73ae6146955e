//! Map marker projection for person profiles.

use crate::model::answer_set::AnswerSet;
use crate::model::person::Person;
use serde::Serialize;

/// Data needed to place one person on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub url: String,
}

impl MapMarker {
    pub fn has_location(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// Builds the marker for `person` from their current answer set.
///
/// The marker has no coordinates when there is no current answer set or it
/// was submitted without a location.
pub fn map_marker(person: &Person, current: Option<&AnswerSet>) -> MapMarker {
    MapMarker {
        name: person.name.clone(),
        lat: current.and_then(|set| set.latitude),
        lng: current.and_then(|set| set.longitude),
        url: person.profile_url(),
    }
}

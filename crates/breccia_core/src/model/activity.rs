//! Scheduled activities and the series that group them.
//!
//! # Invariants
//! - `end_time`, when set, is not earlier than `start_time`.

use super::{validate_name, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type ActivityId = i64;
pub type ActivitySeriesId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySeries {
    pub id: ActivitySeriesId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub series_id: Option<ActivitySeriesId>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub is_online: bool,
    pub location: Option<String>,
}

/// Input for scheduling an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub name: String,
    pub series_id: Option<ActivitySeriesId>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub is_online: bool,
    pub location: Option<String>,
}

impl NewActivity {
    pub fn new(name: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            series_id: None,
            start_time,
            end_time: None,
            is_online: false,
            location: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("name", &self.name)?;
        if let Some(end_time) = self.end_time {
            if end_time < self.start_time {
                return Err(ValidationError::EndsBeforeStart);
            }
        }
        Ok(())
    }
}

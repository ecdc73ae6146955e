//! Read-only activity listings.

use crate::model::activity::{Activity, ActivityId, ActivitySeries, ActivitySeriesId};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::RepoResult;
use serde::Serialize;

/// A series together with its scheduled activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesDetail {
    pub series: ActivitySeries,
    pub activities: Vec<Activity>,
}

pub struct ActivityService<R: ActivityRepository> {
    repo: R,
}

impl<R: ActivityRepository> ActivityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_series(&self) -> RepoResult<Vec<ActivitySeries>> {
        self.repo.list_series()
    }

    pub fn series_detail(&self, id: ActivitySeriesId) -> RepoResult<Option<SeriesDetail>> {
        let Some(series) = self.repo.get_series(id)? else {
            return Ok(None);
        };
        let activities = self.repo.list_activities(Some(series.id))?;
        Ok(Some(SeriesDetail { series, activities }))
    }

    pub fn list_activities(&self) -> RepoResult<Vec<Activity>> {
        self.repo.list_activities(None)
    }

    pub fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        self.repo.get_activity(id)
    }
}

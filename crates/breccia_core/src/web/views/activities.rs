//! Public activity pages.

use super::super::response::{
    ACTIVITY_DETAIL_TEMPLATE, ACTIVITY_LIST_TEMPLATE, ACTIVITY_SERIES_DETAIL_TEMPLATE,
    ACTIVITY_SERIES_LIST_TEMPLATE,
};
use super::super::{Mapper, PageContext, Response, ViewResult, INDEX_URL};
use crate::model::activity::{ActivityId, ActivitySeriesId};
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::service::activity_service::ActivityService;

fn service<'conn>(mapper: &Mapper<'conn>) -> ActivityService<SqliteActivityRepository<'conn>> {
    ActivityService::new(SqliteActivityRepository::new(mapper.conn()))
}

pub(in crate::web) fn series_list(mapper: &Mapper<'_>) -> ViewResult {
    let activity_series_list = service(mapper).list_series()?;
    Ok(mapper.render(
        ACTIVITY_SERIES_LIST_TEMPLATE,
        PageContext::ActivitySeriesList {
            activity_series_list,
        },
    ))
}

pub(in crate::web) fn series_detail(mapper: &Mapper<'_>, pk: ActivitySeriesId) -> ViewResult {
    match service(mapper).series_detail(pk)? {
        Some(detail) => Ok(mapper.render(
            ACTIVITY_SERIES_DETAIL_TEMPLATE,
            PageContext::ActivitySeriesDetail {
                activity_series: detail.series,
                activities: detail.activities,
            },
        )),
        None => Ok(Response::redirect(INDEX_URL)),
    }
}

pub(in crate::web) fn activity_list(mapper: &Mapper<'_>) -> ViewResult {
    let activity_list = service(mapper).list_activities()?;
    Ok(mapper.render(
        ACTIVITY_LIST_TEMPLATE,
        PageContext::ActivityList { activity_list },
    ))
}

pub(in crate::web) fn activity_detail(mapper: &Mapper<'_>, pk: ActivityId) -> ViewResult {
    match service(mapper).get_activity(pk)? {
        Some(activity) => Ok(mapper.render(
            ACTIVITY_DETAIL_TEMPLATE,
            PageContext::ActivityDetail { activity },
        )),
        None => Ok(Response::redirect(INDEX_URL)),
    }
}

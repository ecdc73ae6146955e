use breccia_core::config::ExportedSettings;
use breccia_core::db::open_db_in_memory;
use breccia_core::model::activity::NewActivity;
use breccia_core::model::ValidationError;
use breccia_core::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use breccia_core::repo::RepoError;
use breccia_core::web::response::{
    ACTIVITY_DETAIL_TEMPLATE, ACTIVITY_LIST_TEMPLATE, ACTIVITY_SERIES_DETAIL_TEMPLATE,
    ACTIVITY_SERIES_LIST_TEMPLATE,
};
use breccia_core::web::{Mapper, PageContext, Request, Response};
use chrono::{NaiveDate, NaiveDateTime};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn activities_are_listed_by_start_time() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteActivityRepository::new(&conn);
    let series = repo.create_series("Repair cafe", "Monthly fixing").unwrap();

    let mut late = NewActivity::new("Second session", at(20, 18));
    late.series_id = Some(series.id);
    let mut early = NewActivity::new("First session", at(6, 18));
    early.series_id = Some(series.id);
    early.location = Some("Library".to_string());
    repo.create_activity(&late).unwrap();
    repo.create_activity(&early).unwrap();
    repo.create_activity(&NewActivity::new("Standalone", at(1, 9)))
        .unwrap();

    let all: Vec<String> = repo
        .list_activities(None)
        .unwrap()
        .into_iter()
        .map(|activity| activity.name)
        .collect();
    assert_eq!(all, vec!["Standalone", "First session", "Second session"]);

    let in_series = repo.list_activities(Some(series.id)).unwrap();
    assert_eq!(in_series.len(), 2);
    assert_eq!(in_series[0].location.as_deref(), Some("Library"));
}

#[test]
fn invalid_activities_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteActivityRepository::new(&conn);

    let mut backwards = NewActivity::new("Backwards", at(10, 12));
    backwards.end_time = Some(at(10, 11));
    assert!(matches!(
        repo.create_activity(&backwards).unwrap_err(),
        RepoError::Validation(ValidationError::EndsBeforeStart)
    ));

    let mut orphan = NewActivity::new("Orphan", at(10, 12));
    orphan.series_id = Some(404);
    assert!(matches!(
        repo.create_activity(&orphan).unwrap_err(),
        RepoError::NotFound { id: 404, .. }
    ));
}

#[test]
fn activity_pages_are_public() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteActivityRepository::new(&conn);
    let series = repo.create_series("Walks", "").unwrap();
    let mut walk = NewActivity::new("Riverside walk", at(3, 10));
    walk.series_id = Some(series.id);
    let walk = repo.create_activity(&walk).unwrap();
    let mapper = Mapper::new(&conn, ExportedSettings::default());

    let series_list = mapper.handle(&Request::get("/activity-series/")).unwrap();
    assert_eq!(series_list.template(), Some(ACTIVITY_SERIES_LIST_TEMPLATE));

    let detail = mapper
        .handle(&Request::get(format!("/activity-series/{}", series.id)))
        .unwrap();
    assert_eq!(detail.template(), Some(ACTIVITY_SERIES_DETAIL_TEMPLATE));
    match detail {
        Response::Render(page) => match page.context {
            PageContext::ActivitySeriesDetail {
                activity_series,
                activities,
            } => {
                assert_eq!(activity_series, series);
                assert_eq!(activities, vec![walk.clone()]);
            }
            other => panic!("unexpected context: {other:?}"),
        },
        other => panic!("expected a page, got {other:?}"),
    }

    let list = mapper.handle(&Request::get("/activities")).unwrap();
    assert_eq!(list.template(), Some(ACTIVITY_LIST_TEMPLATE));

    let one = mapper
        .handle(&Request::get(format!("/activities/{}", walk.id)))
        .unwrap();
    assert_eq!(one.template(), Some(ACTIVITY_DETAIL_TEMPLATE));
}

#[test]
fn unknown_activity_ids_redirect_to_index() {
    let conn = open_db_in_memory().unwrap();
    let mapper = Mapper::new(&conn, ExportedSettings::default());

    for path in ["/activities/9", "/activity-series/9"] {
        let response = mapper.handle(&Request::get(path)).unwrap();
        assert_eq!(response.location(), Some("/"));
    }
}

//! Activity and activity-series repository.
//!
//! # Invariants
//! - Activity lists are ordered by `start_time`, then id.

use super::{bool_to_int, int_to_bool, RepoError, RepoResult};
use crate::model::activity::{
    Activity, ActivityId, ActivitySeries, ActivitySeriesId, NewActivity,
};
use crate::model::validate_name;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    name,
    series_id,
    start_time,
    end_time,
    is_online,
    location
FROM activities";

pub trait ActivityRepository {
    fn create_series(&self, name: &str, description: &str) -> RepoResult<ActivitySeries>;
    fn get_series(&self, id: ActivitySeriesId) -> RepoResult<Option<ActivitySeries>>;
    fn list_series(&self) -> RepoResult<Vec<ActivitySeries>>;
    fn create_activity(&self, activity: &NewActivity) -> RepoResult<Activity>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    /// Lists all activities, or only those in `series_id` when given.
    fn list_activities(&self, series_id: Option<ActivitySeriesId>) -> RepoResult<Vec<Activity>>;
}

pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_series(&self, name: &str, description: &str) -> RepoResult<ActivitySeries> {
        validate_name("name", name)?;
        self.conn.execute(
            "INSERT INTO activity_series (name, description) VALUES (?1, ?2);",
            params![name.trim(), description],
        )?;
        Ok(ActivitySeries {
            id: self.conn.last_insert_rowid(),
            name: name.trim().to_string(),
            description: description.to_string(),
        })
    }

    fn get_series(&self, id: ActivitySeriesId) -> RepoResult<Option<ActivitySeries>> {
        let series = self
            .conn
            .query_row(
                "SELECT id, name, description FROM activity_series WHERE id = ?1;",
                [id],
                parse_series_row,
            )
            .optional()?;
        Ok(series)
    }

    fn list_series(&self) -> RepoResult<Vec<ActivitySeries>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description FROM activity_series
             ORDER BY name COLLATE NOCASE ASC, id ASC;",
        )?;
        let series = stmt
            .query_map([], parse_series_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    }

    fn create_activity(&self, activity: &NewActivity) -> RepoResult<Activity> {
        activity.validate()?;
        if let Some(series_id) = activity.series_id {
            if self.get_series(series_id)?.is_none() {
                return Err(RepoError::NotFound {
                    entity: "activity series",
                    id: series_id,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO activities (
                name,
                series_id,
                start_time,
                end_time,
                is_online,
                location
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                activity.name.trim(),
                activity.series_id,
                activity.start_time,
                activity.end_time,
                bool_to_int(activity.is_online),
                activity.location.as_deref(),
            ],
        )?;

        Ok(Activity {
            id: self.conn.last_insert_rowid(),
            name: activity.name.trim().to_string(),
            series_id: activity.series_id,
            start_time: activity.start_time,
            end_time: activity.end_time,
            is_online: activity.is_online,
            location: activity.location.clone(),
        })
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }
        Ok(None)
    }

    fn list_activities(&self, series_id: Option<ActivitySeriesId>) -> RepoResult<Vec<Activity>> {
        let mut sql = format!("{ACTIVITY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(series_id) = series_id {
            sql.push_str(" AND series_id = ?");
            bind_values.push(Value::Integer(series_id));
        }
        sql.push_str(" ORDER BY start_time ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }
}

fn parse_series_row(row: &Row<'_>) -> rusqlite::Result<ActivitySeries> {
    Ok(ActivitySeries {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        series_id: row.get("series_id")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        is_online: int_to_bool("activities", "is_online", row.get("is_online")?)?,
        location: row.get("location")?,
    })
}

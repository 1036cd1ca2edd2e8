use crate::db::connection::Database;
use crate::errors::StoreError;
use crate::pipeline::{CityOutcome, CityResult};
use chrono::NaiveDateTime;
use rusqlite::params;

#[derive(Debug)]
pub struct SyncRun {
    pub id: i64,
    pub city: String,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub sold_count: i64,
    pub new_count: i64,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn record_city_run(db: &Database, outcome: &CityOutcome) -> Result<i64, StoreError> {
    let (sold, added, success, error) = match &outcome.result {
        CityResult::Updated { sold, added } => (*sold, *added, true, None),
        CityResult::NoNewVehicles { sold } => (*sold, 0, true, None),
        CityResult::Failed { error } => (0, 0, false, Some(error.as_str())),
    };

    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO sync_runs
                (city, started_at, finished_at, sold_count, new_count, success, error_message)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                outcome.city,
                outcome.started_at.naive_utc(),
                outcome.finished_at.naive_utc(),
                sold as i64,
                added as i64,
                success,
                error
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn recent_runs(db: &Database, limit: usize) -> Result<Vec<SyncRun>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, city, started_at, finished_at, sold_count, new_count, success, error_message \
             FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SyncRun {
                id: row.get(0)?,
                city: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                sold_count: row.get(4)?,
                new_count: row.get(5)?,
                success: row.get(6)?,
                error_message: row.get(7)?,
            })
        })?;

        let mut runs = Vec::new();
        for r in rows {
            runs.push(r?);
        }
        Ok(runs)
    })
}

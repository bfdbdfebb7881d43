//! SQLite-based session history.
//!
//! Provides persistent storage for:
//! - Finished and stopped timer records
//! - The pauses taken during each record
//! - Daily statistics used to seed a new session

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection};

use crate::error::{DatabaseError, Result};
use crate::ports::HistoryStore;
use crate::record::{DailyStatistics, FinishReason, TimerRecord};
use crate::timer::{PauseRecord, SessionType};

use super::Config;

/// SQLite database for timer records.
pub struct Database {
    conn: Connection,
}

/// A record row before it is validated back into a [`TimerRecord`].
struct RecordRow {
    id: i64,
    session_type: String,
    reason: String,
    duration_min: u32,
    description: String,
    started_at: String,
    finished_at: String,
}

impl Database {
    /// Open the database named by `storage.database_file` in the config.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the config cannot be loaded, or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&Config::load()?.database_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS records (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                session_type TEXT NOT NULL,
                reason       TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                description  TEXT NOT NULL DEFAULT '',
                started_at   TEXT NOT NULL,
                finished_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pauses (
                record_id   INTEGER NOT NULL REFERENCES records(id) ON DELETE CASCADE,
                seq         INTEGER NOT NULL,
                paused_at   TEXT NOT NULL,
                unpaused_at TEXT,
                PRIMARY KEY (record_id, seq)
            );

            CREATE INDEX IF NOT EXISTS idx_records_finished_at ON records(finished_at);
            CREATE INDEX IF NOT EXISTS idx_records_finished_at_type ON records(finished_at, session_type);",
        )?;
        Ok(())
    }

    /// Store a record and its pauses. Returns the new row id.
    pub fn insert_record(&mut self, record: &TimerRecord) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO records (session_type, reason, duration_min, description, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.session_type().as_str(),
                record.reason().as_str(),
                record.duration_minutes(),
                record.description(),
                encode_ts(record.started_at()),
                encode_ts(record.finished_at()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        for (seq, pause) in record.pause_records().iter().enumerate() {
            tx.execute(
                "INSERT INTO pauses (record_id, seq, paused_at, unpaused_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    seq as i64,
                    encode_ts(pause.paused_at()),
                    pause.unpaused_at().map(encode_ts),
                ],
            )?;
        }
        tx.commit()?;
        Ok(id)
    }

    /// Every record, most recently finished first.
    pub fn all_records(&self) -> Result<Vec<TimerRecord>> {
        self.query_records(None)
    }

    /// Records finished within `[start, end)`, most recent first.
    pub fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimerRecord>> {
        self.query_records(Some((start, end)))
    }

    /// Records finished on the given local calendar day.
    pub fn records_on(&self, date: NaiveDate) -> Result<Vec<TimerRecord>> {
        let (start, end) = local_day_bounds(date)?;
        self.records_between(start, end)
    }

    /// Statistics for a local calendar day: completed work sessions only.
    pub fn load_statistics(&self, date: NaiveDate) -> Result<DailyStatistics> {
        let (start, end) = local_day_bounds(date)?;
        let completed: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM records
             WHERE finished_at >= ?1 AND finished_at < ?2
               AND session_type = ?3 AND reason = ?4",
            params![
                encode_ts(start),
                encode_ts(end),
                SessionType::Work.as_str(),
                FinishReason::Completed.as_str(),
            ],
            |row| row.get(0),
        )?;
        let stats = DailyStatistics::from_completed(date, completed);
        tracing::debug!(
            %date,
            completed_pomodoros = stats.completed_pomodoros(),
            current_cycle = stats.current_cycle(),
            "loaded daily statistics"
        );
        Ok(stats)
    }

    /// Delete every record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM records", [])?;
        tracing::info!(removed, "cleared timer records");
        Ok(removed)
    }

    fn query_records(&self, range: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Result<Vec<TimerRecord>> {
        let (from, to) = match range {
            Some((start, end)) => (encode_ts(start), encode_ts(end)),
            None => (String::new(), "~".to_string()),
        };
        let mut stmt = self.conn.prepare(
            "SELECT id, session_type, reason, duration_min, description, started_at, finished_at
             FROM records
             WHERE finished_at >= ?1 AND finished_at < ?2
             ORDER BY finished_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(RecordRow {
                    id: row.get(0)?,
                    session_type: row.get(1)?,
                    reason: row.get(2)?,
                    duration_min: row.get(3)?,
                    description: row.get(4)?,
                    started_at: row.get(5)?,
                    finished_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| self.hydrate(row)).collect::<Result<Vec<_>>>()
    }

    fn pauses_for(&self, record_id: i64) -> Result<Vec<PauseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT paused_at, unpaused_at FROM pauses WHERE record_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![record_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let pauses = rows
            .into_iter()
            .map(|(paused_at, unpaused_at)| {
                let paused_at = decode_ts("pauses", &paused_at)?;
                match unpaused_at {
                    None => Ok(PauseRecord::open(paused_at)),
                    Some(end) => PauseRecord::closed(paused_at, decode_ts("pauses", &end)?)
                        .map_err(|e| corrupt("pauses", e.to_string())),
                }
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(pauses)
    }

    fn hydrate(&self, row: RecordRow) -> Result<TimerRecord> {
        let session_type: SessionType = row
            .session_type
            .parse()
            .map_err(|e: crate::CoreError| corrupt("records", e.to_string()))?;
        let reason: FinishReason = row
            .reason
            .parse()
            .map_err(|e: crate::CoreError| corrupt("records", e.to_string()))?;
        TimerRecord::new(
            decode_ts("records", &row.started_at)?,
            decode_ts("records", &row.finished_at)?,
            reason,
            session_type,
            row.duration_min,
            row.description,
            self.pauses_for(row.id)?,
        )
        .map_err(|e| corrupt("records", e.to_string()).into())
    }
}

impl HistoryStore for Database {
    fn load_today_statistics(&mut self) -> Result<DailyStatistics> {
        self.load_statistics(Local::now().date_naive())
    }

    fn save_record(&mut self, record: &TimerRecord) -> Result<()> {
        self.insert_record(record).map(|_| ())
    }
}

/// Fixed-width UTC text so lexical order matches time order.
fn encode_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_ts(table: &str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(table, format!("bad timestamp '{raw}': {e}")))
}

fn corrupt(table: &str, message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        message,
    }
}

/// UTC instants of local midnight at the start and end of `date`.
fn local_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let midnight = |day: NaiveDate| -> Option<DateTime<Utc>> {
        let naive = day.and_hms_opt(0, 0, 0)?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    };
    let start = midnight(date);
    let end = date.succ_opt().and_then(midnight);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(crate::CoreError::InvalidArgument(format!(
            "no local midnight for {date}"
        ))),
    }
}
